//! Year management for the model
//!
//! The model executes in discrete years. Each year is split into an ordered
//! set of time steps, and a full iteration walks every year once. This module
//! provides deterministic year advancement over either the historical range
//! (`start_year..=final_year`) or the projection range
//! (`start_year..=projection_final_year`).

use serde::{Deserialize, Serialize};

/// Tracks the current year within the configured year ranges
///
/// # Example
/// ```
/// use stock_model_core_rs::YearCalendar;
///
/// let mut calendar = YearCalendar::new(1990, 1992, 1995);
/// calendar.begin_iteration();
/// assert_eq!(calendar.current_year(), 1990);
///
/// calendar.advance_year();
/// assert_eq!(calendar.current_year(), 1991);
/// assert_eq!(calendar.years(), vec![1990, 1991, 1992]);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct YearCalendar {
    start_year: u32,
    final_year: u32,
    projection_final_year: u32,
    current_year: u32,
}

impl YearCalendar {
    /// Create a new calendar
    ///
    /// `projection_final_year` values earlier than `final_year` are raised to
    /// `final_year` so the projection range always covers the historical one.
    ///
    /// # Panics
    /// Panics if `final_year < start_year`. Configuration validation rejects
    /// that case before a calendar is ever built.
    pub fn new(start_year: u32, final_year: u32, projection_final_year: u32) -> Self {
        assert!(
            final_year >= start_year,
            "final_year must not precede start_year"
        );
        Self {
            start_year,
            final_year,
            projection_final_year: projection_final_year.max(final_year),
            current_year: start_year,
        }
    }

    /// Rewind to the first year ahead of a full iteration
    pub fn begin_iteration(&mut self) {
        self.current_year = self.start_year;
    }

    /// Advance to the next year
    pub fn advance_year(&mut self) {
        self.current_year += 1;
    }

    /// Get the year currently being executed
    pub fn current_year(&self) -> u32 {
        self.current_year
    }

    pub fn start_year(&self) -> u32 {
        self.start_year
    }

    pub fn final_year(&self) -> u32 {
        self.final_year
    }

    pub fn projection_final_year(&self) -> u32 {
        self.projection_final_year
    }

    /// Last year executed by an iteration
    ///
    /// # Example
    /// ```
    /// use stock_model_core_rs::YearCalendar;
    ///
    /// let calendar = YearCalendar::new(2000, 2010, 2015);
    /// assert_eq!(calendar.last_year(false), 2010);
    /// assert_eq!(calendar.last_year(true), 2015);
    /// ```
    pub fn last_year(&self, projecting: bool) -> u32 {
        if projecting {
            self.projection_final_year
        } else {
            self.final_year
        }
    }

    /// Historical years, `start_year..=final_year`
    pub fn years(&self) -> Vec<u32> {
        (self.start_year..=self.final_year).collect()
    }

    /// Historical plus projection years, `start_year..=projection_final_year`
    pub fn years_all(&self) -> Vec<u32> {
        (self.start_year..=self.projection_final_year).collect()
    }

    /// Number of historical years
    ///
    /// # Example
    /// ```
    /// use stock_model_core_rs::YearCalendar;
    ///
    /// let calendar = YearCalendar::new(1990, 1999, 1999);
    /// assert_eq!(calendar.year_spread(), 10);
    /// ```
    pub fn year_spread(&self) -> u32 {
        self.final_year - self.start_year + 1
    }

    /// Number of years an iteration executes
    pub fn iteration_length(&self, projecting: bool) -> u32 {
        self.last_year(projecting) - self.start_year + 1
    }
}

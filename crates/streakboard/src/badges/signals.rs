use std::collections::BTreeSet;

use chrono::NaiveDate;

use crate::attendance::calendar::DayKey;

/// External facts about a calendar day that some special badges depend on.
pub trait DaySignals: Send + Sync {
    fn is_holiday(&self, day: DayKey) -> bool;
    fn is_rainy(&self, day: DayKey) -> bool;
}

/// No holiday calendar and no weather feed; every signal reads false.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoDaySignals;

impl DaySignals for NoDaySignals {
    fn is_holiday(&self, _day: DayKey) -> bool {
        false
    }

    fn is_rainy(&self, _day: DayKey) -> bool {
        false
    }
}

/// Fixed list of holidays. Has no weather data.
#[derive(Debug, Clone, Default)]
pub struct HolidayCalendar {
    holidays: BTreeSet<DayKey>,
}

impl HolidayCalendar {
    pub fn new<I>(dates: I) -> Self
    where
        I: IntoIterator<Item = NaiveDate>,
    {
        Self {
            holidays: dates.into_iter().map(DayKey::new).collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.holidays.len()
    }

    pub fn is_empty(&self) -> bool {
        self.holidays.is_empty()
    }
}

impl DaySignals for HolidayCalendar {
    fn is_holiday(&self, day: DayKey) -> bool {
        self.holidays.contains(&day)
    }

    fn is_rainy(&self, _day: DayKey) -> bool {
        false
    }
}

pub mod activity;
pub mod schedule;

pub use activity::{
    ActivityRequest, ActivityResponse, ActivitySuggestion, FamilyMember, suggest_activities,
};
pub use schedule::{
    Event, ScheduleConflict, ScheduleRequest, ScheduleResponse, analyze_schedule,
};

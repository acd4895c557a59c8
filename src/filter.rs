use crate::models::hackathon::{Attendance, Hackathon};

/// Which hackathons a listing shows
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum AttendanceFilter {
    #[default]
    All,
    InPerson,
    Virtual,
}

impl AttendanceFilter {
    pub fn matches(self, hackathon: &Hackathon) -> bool {
        match self {
            AttendanceFilter::All => true,
            AttendanceFilter::InPerson => hackathon.kind == Attendance::InPerson,
            AttendanceFilter::Virtual => hackathon.kind == Attendance::Virtual,
        }
    }
}

/// Projects the collection without reordering it
pub fn filter(hackathons: &[Hackathon], criterion: AttendanceFilter) -> Vec<&Hackathon> {
    hackathons.iter().filter(|h| criterion.matches(h)).collect()
}

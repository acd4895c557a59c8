pub mod hackathons;
pub mod lookup;
pub mod streak;

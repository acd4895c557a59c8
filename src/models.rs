pub mod countdown;
pub mod draft;
pub mod hackathon;
pub mod stage;
pub mod streak;

pub mod profile;
pub mod watchlist;

pub use profile::{NewProfile, NotificationSettings, Preferences, ProfileUpdate, UserProfile};
pub use watchlist::{EntryUpdate, MovieId, NewEntry, WatchlistEntry};

pub mod manager;
pub mod resume;
pub mod state;

pub use manager::{load_session, read_session, session_path, LoadedSession, SessionWriter};
pub use resume::{NoResume, ResumeSink, TargetResumer};
pub use state::{ResumedQueries, SessionLine};

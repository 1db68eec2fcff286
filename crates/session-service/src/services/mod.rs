pub mod session_manager;
pub mod subject_status;

pub use session_manager::{
    AuthenticatedSubject, IssuedToken, SessionManager, SessionPolicy, TokenPair,
};
pub use subject_status::{AlwaysActive, SubjectStatus};

pub mod analysis;
pub mod media;
pub mod user;

pub use analysis::{
    score_pct, AnalysisItem, AnalysisResult, AnalysisStatus, AnalysisStatusKind, Issue,
    IssueKind, Metrics,
};
pub use media::{detect_url_media, ContextImage, FileInput, MediaType, MediaUrl};
pub use user::User;

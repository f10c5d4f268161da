pub mod email;
pub use email::{EmailError, EmailMessage, EmailQueue, EmailTransport, MemoryMailer};

pub mod live;
pub use live::LiveUpdates;

pub mod notification;
pub use notification::{BulkEmail, BulkReceipt, NotificationError, NotificationFanout};

pub mod templates;

pub mod scheduler;
pub use scheduler::Scheduler;

pub mod issue_service;
pub mod issue_service_impl;
pub use issue_service::{IssueError, IssueService};
pub use issue_service_impl::SeaOrmIssueService;

pub mod file_service;
pub mod file_service_impl;
pub use file_service::{Download, FileError, FileService, FileStorage, Upload};
pub use file_service_impl::SeaOrmFileService;

pub mod auth_service;
pub mod auth_service_impl;
pub use auth_service::{AuthError, AuthService, LoginResult, Registration};
pub use auth_service_impl::SeaOrmAuthService;

pub mod user_service;
pub mod user_service_impl;
pub use user_service::{UserError, UserService};
pub use user_service_impl::SeaOrmUserService;

pub mod stats_service;
pub mod stats_service_impl;
pub use stats_service::{StatsError, StatsService};
pub use stats_service_impl::SeaOrmStatsService;

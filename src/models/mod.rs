pub mod task;
pub mod user;

pub use task::{TagQuery, Task, TaskInput, TaskOrder, TaskPriority, TaskStatus, TaskTag, TaskUpdate};
pub use user::{Credential, UserProfile, UserSettingsUpdate};

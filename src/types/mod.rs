mod avatar;
mod linkable;
mod priority;
mod project;
mod status;
mod user;
mod value;
mod work_package;
mod work_package_type;

pub use avatar::UserAvatar;
pub use linkable::Linkable;
pub use priority::Priority;
pub use project::Project;
pub use status::Status;
pub use user::User;
pub use value::FieldValue;
pub use work_package::WorkPackage;
pub use work_package_type::WorkPackageType;

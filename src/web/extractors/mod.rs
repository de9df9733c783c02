pub mod current_user;
pub mod id_path;
pub mod query_params;
pub mod validated_json;

pub use current_user::*;
pub use id_path::*;
pub use query_params::*;
pub use validated_json::*;

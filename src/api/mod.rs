pub mod error;
pub mod middleware;
pub mod routes;
pub mod session;
pub mod state;
pub mod views;

pub use error::ApiError;
pub use routes::create_router;
pub use state::AppState;

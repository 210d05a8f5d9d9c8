//! `/auth/*` endpoints. These only talk to the backend; persisting the
//! returned token is up to the caller (see `App::login`).

use super::{ApiClient, ApiResult};
use crate::models::{AuthResponse, LoginRequest, ProfileUpdate, RegisterRequest, User};

impl ApiClient {
    pub async fn register(&self, request: &RegisterRequest) -> ApiResult<AuthResponse> {
        self.post("/auth/register", request).await
    }

    pub async fn login(&self, request: &LoginRequest) -> ApiResult<AuthResponse> {
        self.post("/auth/login", request).await
    }

    pub async fn profile(&self) -> ApiResult<User> {
        self.get("/auth/profile", &[]).await
    }

    pub async fn update_profile(&self, update: &ProfileUpdate) -> ApiResult<User> {
        self.put("/auth/profile", update).await
    }
}

pub mod migrations;
pub mod store;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::api::ApiClient;
use crate::models::{LoginResponse, Role};
use crate::routes::landing_route;
use crate::session::store::LocalStore;

pub const TOKEN_KEY: &str = "token";
pub const USER_KEY: &str = "user";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SessionUser {
    pub id: i64,
    pub username: String,
    pub role: Role,
    pub email: String,
    pub full_name: String,
}

impl From<&LoginResponse> for SessionUser {
    fn from(value: &LoginResponse) -> Self {
        Self {
            id: value.id,
            username: value
                .username
                .clone()
                .unwrap_or_else(|| value.email.clone()),
            role: value.role,
            email: value.email.clone(),
            full_name: value.full_name.clone(),
        }
    }
}

pub struct Session {
    store: LocalStore,
    token: Option<String>,
    user: Option<SessionUser>,
}

impl Session {
    pub fn hydrate(store: LocalStore) -> Result<Self> {
        let token = store.get(TOKEN_KEY)?;
        let user = match (&token, store.get(USER_KEY)?) {
            (Some(_), Some(raw)) => match serde_json::from_str::<SessionUser>(&raw) {
                Ok(user) => Some(user),
                Err(err) => {
                    warn!("discarding unreadable cached user profile: {err}");
                    None
                }
            },
            _ => None,
        };
        Ok(Self { store, token, user })
    }

    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    pub fn user(&self) -> Option<&SessionUser> {
        self.user.as_ref()
    }

    pub fn role(&self) -> Option<Role> {
        self.user.as_ref().map(|u| u.role)
    }

    pub fn is_authenticated(&self) -> bool {
        self.token.is_some() && self.user.is_some()
    }

    pub async fn login(
        &mut self,
        client: &ApiClient,
        username: &str,
        password: &str,
    ) -> Result<&'static str> {
        let response = client.login(username, password).await?;
        self.establish(&response)?;
        let role = response.role;
        info!("signed in as {} ({role})", response.email);
        Ok(landing_route(role))
    }

    pub fn establish(&mut self, response: &LoginResponse) -> Result<()> {
        let user = SessionUser::from(response);
        let encoded = serde_json::to_string(&user).context("failed encoding session user")?;
        self.store.set(TOKEN_KEY, &response.access_token)?;
        self.store.set(USER_KEY, &encoded)?;
        self.token = Some(response.access_token.clone());
        self.user = Some(user);
        Ok(())
    }

    pub fn logout(&mut self) -> Result<()> {
        self.store.remove(TOKEN_KEY)?;
        self.store.remove(USER_KEY)?;
        self.token = None;
        self.user = None;
        Ok(())
    }

    pub fn store(&self) -> &LocalStore {
        &self.store
    }
}

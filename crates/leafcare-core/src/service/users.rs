//! User accounts and login

use tracing::{info, warn};

use super::{
    condition, decode_all, is_blank, load, persist, present, ApiError, ApiResult, LeafCare,
};
use crate::auth::{hash_password, verify_password};
use crate::criteria::Criteria;
use crate::document::DocumentId;
use crate::models::{NewUser, Page, PageRequest, User, UserProfile, UserUpdate};

const INVALID_CREDENTIALS: &str = "Invalid credentials";
const HIDDEN_USER: &str = "User not found or permission denied";

impl LeafCare {
    /// Check credentials and issue an access token
    pub async fn login(&self, email: &str, password: &str) -> ApiResult<String> {
        if is_blank(email) || password.is_empty() {
            return Err(ApiError::bad_request("Email and password are required"));
        }

        let user: Option<User> = match self.users.find_one_by(&Criteria::eq("email", email)).await {
            Some(doc) => Some(doc.into_record()?),
            None => None,
        };

        let user = match user {
            Some(user) if verify_password(password, &user.password) => user,
            _ => {
                warn!(email, "login rejected");
                return Err(ApiError::bad_request(INVALID_CREDENTIALS));
            }
        };

        let id = user.id.ok_or(ApiError::Internal)?;
        Ok(self.tokens.issue(id, &user.email, user.is_admin)?)
    }

    /// Register a user
    ///
    /// Anyone may register a regular account. An admin account can be
    /// created by an admin, or by anyone while no user exists yet.
    pub async fn create_user(&self, token: Option<&str>, input: NewUser) -> ApiResult<UserProfile> {
        if [&input.first_name, &input.last_name, &input.email]
            .iter()
            .any(|v| is_blank(v))
            || input.password.is_empty()
        {
            return Err(ApiError::bad_request("All fields are required"));
        }

        let _guard = self.locks.users.lock().await;
        if input.is_admin && !self.users.is_empty().await {
            self.authenticate_admin(token, "Admin access required to create an admin")?;
        }

        if self
            .users
            .find_one_by(&Criteria::eq("email", input.email.as_str()))
            .await
            .is_some()
        {
            return Err(ApiError::conflict("Email already exists"));
        }

        let user = User {
            id: None,
            first_name: input.first_name,
            last_name: input.last_name,
            email: input.email,
            password: hash_password(&input.password)?,
            is_admin: input.is_admin,
        };
        let user = persist(&self.users, &user).await?;
        info!(id = ?user.id, admin = user.is_admin, "user created");

        UserProfile::of(&user).ok_or(ApiError::Internal)
    }

    /// List users (admins only), optionally by first or last name
    pub async fn list_users(
        &self,
        token: Option<&str>,
        request: PageRequest,
        name: Option<&str>,
    ) -> ApiResult<Page<UserProfile>> {
        self.authenticate_admin(token, "Forbidden: Admin access required")?;
        if !request.is_valid() {
            return Err(ApiError::bad_request("page and limit must be at least 1"));
        }

        let criteria = match name.filter(|n| !is_blank(n)) {
            Some(name) => Criteria::any_of([
                condition("first_name", name),
                condition("last_name", name),
            ]),
            None => Criteria::all(),
        };

        let users: Vec<User> = decode_all(self.users.find_by(&criteria).await)?;
        let profiles = users.iter().filter_map(UserProfile::of).collect();
        Ok(Page::paginate(profiles, request))
    }

    /// Fetch a user; callers see themselves, admins see everyone
    pub async fn get_user(&self, token: Option<&str>, id: DocumentId) -> ApiResult<UserProfile> {
        let claims = self.authenticate(token)?;

        let user: User = load(&self.users, id)
            .await?
            .filter(|_| claims.is_user(id) || claims.is_admin)
            .ok_or_else(|| ApiError::not_found(HIDDEN_USER))?;
        UserProfile::of(&user).ok_or(ApiError::Internal)
    }

    /// Update names or password of a user
    ///
    /// A password change always requires the current password.
    pub async fn update_user(
        &self,
        token: Option<&str>,
        id: DocumentId,
        update: UserUpdate,
    ) -> ApiResult<UserProfile> {
        let claims = self.authenticate(token)?;

        let mut user: User = load(&self.users, id)
            .await?
            .filter(|_| claims.is_user(id) || claims.is_admin)
            .ok_or_else(|| ApiError::not_found(HIDDEN_USER))?;

        let new_password = present(update.new_password);
        if new_password.is_some() {
            let current_ok = present(update.current_password)
                .is_some_and(|current| verify_password(&current, &user.password));
            if !current_ok {
                return Err(ApiError::bad_request("Invalid current password"));
            }
        }

        if let Some(first_name) = present(update.first_name) {
            user.first_name = first_name;
        }
        if let Some(last_name) = present(update.last_name) {
            user.last_name = last_name;
        }
        if let Some(password) = new_password {
            user.password = hash_password(&password)?;
        }

        let user = persist(&self.users, &user).await?;
        UserProfile::of(&user).ok_or(ApiError::Internal)
    }

    /// Delete a user (admins only)
    pub async fn delete_user(&self, token: Option<&str>, id: DocumentId) -> ApiResult<()> {
        self.authenticate_admin(token, "Permission denied")?;

        match self.users.delete(id).await? {
            Some(_) => {
                info!(%id, "user deleted");
                Ok(())
            }
            None => Err(ApiError::not_found("User not found")),
        }
    }
}

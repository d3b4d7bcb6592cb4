//! Plants
//!
//! Every plant belongs to the user who created it. Names are unique per
//! owner, not globally.

use serde_json::Value;
use tracing::info;

use super::{
    condition, decode_all, is_blank, load, persist, present, ApiError, ApiResult, LeafCare,
};
use crate::auth::Claims;
use crate::criteria::Criteria;
use crate::document::DocumentId;
use crate::models::{Page, PageRequest, Plant, PlantFilter, User};

const PLANT_NOT_FOUND: &str = "Plant not found";
const PERMISSION_DENIED: &str = "Permission denied";
const DUPLICATE_NAME: &str = "Plant name must be unique among user's plants";

impl LeafCare {
    /// Create a plant owned by the caller
    pub async fn create_plant(&self, token: Option<&str>, name: &str) -> ApiResult<Plant> {
        let claims = self.authenticate(token)?;
        if is_blank(name) {
            return Err(ApiError::bad_request("Plant name is required"));
        }
        let _guard = self.locks.plants.lock().await;
        self.ensure_name_free(claims.id, name, None).await?;

        let plant = Plant {
            id: None,
            name: name.to_string(),
            user_id: claims.id,
        };
        let plant = persist(&self.plants, &plant).await?;
        info!(id = ?plant.id, owner = %claims.id, "plant created");
        Ok(plant)
    }

    /// List plants: admins see every plant, users their own
    ///
    /// `filter.name` keeps plants whose name contains the text, ignoring
    /// case. `filter.user_name` is only honored for admins.
    pub async fn list_plants(
        &self,
        token: Option<&str>,
        request: PageRequest,
        filter: PlantFilter,
    ) -> ApiResult<Page<Plant>> {
        let claims = self.authenticate(token)?;
        if !request.is_valid() {
            return Err(ApiError::bad_request("page and limit must be at least 1"));
        }

        let mut plants: Vec<Plant> = if claims.is_admin {
            match present(filter.user_name) {
                Some(user_name) => self.plants_of_users_named(&user_name).await?,
                None => decode_all(self.plants.find_all().await)?,
            }
        } else {
            decode_all(self.plants.find_by(&Criteria::eq("userId", claims.id)).await)?
        };

        if let Some(name) = present(filter.name) {
            let needle = name.to_lowercase();
            plants.retain(|plant| plant.name.to_lowercase().contains(&needle));
        }

        Ok(Page::paginate(plants, request))
    }

    /// Fetch a plant; visible to its owner and to admins
    pub async fn get_plant(&self, token: Option<&str>, id: DocumentId) -> ApiResult<Plant> {
        let claims = self.authenticate(token)?;

        let plant: Plant = load(&self.plants, id)
            .await?
            .ok_or_else(|| ApiError::not_found(PLANT_NOT_FOUND))?;
        if !claims.is_admin && !claims.is_user(plant.user_id) {
            return Err(ApiError::forbidden(PERMISSION_DENIED));
        }
        Ok(plant)
    }

    /// Rename a plant (owner only)
    pub async fn update_plant(
        &self,
        token: Option<&str>,
        id: DocumentId,
        name: Option<String>,
    ) -> ApiResult<Plant> {
        let claims = self.authenticate(token)?;
        let _guard = self.locks.plants.lock().await;
        let mut plant = self.owned_plant(&claims, id).await?;

        if let Some(name) = present(name) {
            if name != plant.name {
                self.ensure_name_free(claims.id, &name, Some(id)).await?;
            }
            plant.name = name;
        }

        persist(&self.plants, &plant).await
    }

    /// Delete a plant (owner only)
    pub async fn delete_plant(&self, token: Option<&str>, id: DocumentId) -> ApiResult<()> {
        let claims = self.authenticate(token)?;
        let _guard = self.locks.plants.lock().await;
        self.owned_plant(&claims, id).await?;

        match self.plants.delete(id).await? {
            Some(_) => {
                info!(%id, "plant deleted");
                Ok(())
            }
            None => Err(ApiError::not_found(PLANT_NOT_FOUND)),
        }
    }

    async fn owned_plant(&self, claims: &Claims, id: DocumentId) -> ApiResult<Plant> {
        let plant: Plant = load(&self.plants, id)
            .await?
            .ok_or_else(|| ApiError::not_found(PLANT_NOT_FOUND))?;
        if !claims.is_user(plant.user_id) {
            return Err(ApiError::forbidden(PERMISSION_DENIED));
        }
        Ok(plant)
    }

    async fn ensure_name_free(
        &self,
        owner: DocumentId,
        name: &str,
        except: Option<DocumentId>,
    ) -> ApiResult<()> {
        let criteria = Criteria::eq("userId", owner).field("name", name);
        match self.plants.find_one_by(&criteria).await {
            Some(existing) if existing.id() != except => Err(ApiError::conflict(DUPLICATE_NAME)),
            _ => Ok(()),
        }
    }

    /// Plants whose owner's first or last name equals `user_name`
    async fn plants_of_users_named(&self, user_name: &str) -> ApiResult<Vec<Plant>> {
        let owners = Criteria::any_of([
            condition("first_name", user_name),
            condition("last_name", user_name),
        ]);
        let owners: Vec<User> = decode_all(self.users.find_by(&owners).await)?;
        let ids: Vec<Value> = owners.iter().filter_map(|u| u.id).map(Value::from).collect();
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let by_owner = Criteria::any_of(ids.into_iter().map(|id| condition("userId", id)));
        decode_all(self.plants.find_by(&by_owner).await)
    }
}

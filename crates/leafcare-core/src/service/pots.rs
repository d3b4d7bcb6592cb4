//! Irrigation pots
//!
//! Pots are registered and managed by admins. A pot may be assigned to a
//! user, who can then see it.

use tracing::info;

use super::{decode_all, is_blank, load, persist, present, ApiError, ApiResult, LeafCare};
use crate::criteria::Criteria;
use crate::document::DocumentId;
use crate::models::{NewPot, Page, PageRequest, Pot, PotSummary, PotUpdate};

const PERMISSION_DENIED: &str = "Permission denied";
const POT_NOT_FOUND: &str = "Pot not found";

impl LeafCare {
    /// Register a pot (admins only); codes are unique
    pub async fn create_pot(&self, token: Option<&str>, input: NewPot) -> ApiResult<Pot> {
        self.authenticate_admin(token, PERMISSION_DENIED)?;

        if is_blank(&input.code) || is_blank(&input.pot_model_id) {
            return Err(ApiError::bad_request(
                "Code and pot_model_id are required",
            ));
        }
        let _guard = self.locks.pots.lock().await;
        self.ensure_code_free(&input.code, None).await?;

        let pot = Pot {
            id: None,
            code: input.code,
            pot_model_id: input.pot_model_id,
            user_id: None,
        };
        let pot = persist(&self.pots, &pot).await?;
        info!(id = ?pot.id, code = %pot.code, "pot created");
        Ok(pot)
    }

    /// List pots: admins see every pot, users the pots assigned to them
    pub async fn list_pots(
        &self,
        token: Option<&str>,
        request: PageRequest,
    ) -> ApiResult<Page<PotSummary>> {
        let claims = self.authenticate(token)?;
        if !request.is_valid() {
            return Err(ApiError::bad_request("page and limit must be at least 1"));
        }

        let docs = if claims.is_admin {
            self.pots.find_all().await
        } else {
            self.pots.find_by(&Criteria::eq("userId", claims.id)).await
        };
        let pots: Vec<Pot> = decode_all(docs)?;

        let summaries = pots.iter().filter_map(PotSummary::of).collect();
        let page = Page::paginate(summaries, request);
        if page.data.is_empty() {
            return Err(ApiError::forbidden("No pots found for this user"));
        }
        Ok(page)
    }

    /// Fetch a pot; visible to its user and to admins
    pub async fn get_pot(&self, token: Option<&str>, id: DocumentId) -> ApiResult<Pot> {
        let claims = self.authenticate(token)?;

        load(&self.pots, id)
            .await?
            .filter(|pot: &Pot| claims.is_admin || pot.user_id == Some(claims.id))
            .ok_or_else(|| ApiError::not_found("Pot not found or permission denied"))
    }

    /// Change a pot's code, model or assigned user (admins only)
    pub async fn update_pot(
        &self,
        token: Option<&str>,
        id: DocumentId,
        update: PotUpdate,
    ) -> ApiResult<Pot> {
        self.authenticate_admin(token, PERMISSION_DENIED)?;

        let _guard = self.locks.pots.lock().await;
        let mut pot: Pot = load(&self.pots, id)
            .await?
            .ok_or_else(|| ApiError::not_found(POT_NOT_FOUND))?;

        if let Some(code) = present(update.code) {
            if code != pot.code {
                self.ensure_code_free(&code, Some(id)).await?;
            }
            pot.code = code;
        }
        if let Some(model) = present(update.pot_model_id) {
            pot.pot_model_id = model;
        }
        if let Some(user_id) = update.user_id {
            if self.users.find(user_id).await.is_none() {
                return Err(ApiError::bad_request(format!("No user with id {}", user_id)));
            }
            pot.user_id = Some(user_id);
        }

        persist(&self.pots, &pot).await
    }

    /// Delete a pot (admins only)
    pub async fn delete_pot(&self, token: Option<&str>, id: DocumentId) -> ApiResult<()> {
        self.authenticate_admin(token, PERMISSION_DENIED)?;

        match self.pots.delete(id).await? {
            Some(_) => {
                info!(%id, "pot deleted");
                Ok(())
            }
            None => Err(ApiError::not_found(POT_NOT_FOUND)),
        }
    }

    async fn ensure_code_free(&self, code: &str, except: Option<DocumentId>) -> ApiResult<()> {
        match self.pots.find_one_by(&Criteria::eq("code", code)).await {
            Some(existing) if existing.id() != except => {
                Err(ApiError::conflict("Pot code already exists"))
            }
            _ => Ok(()),
        }
    }
}

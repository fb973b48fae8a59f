use chrono::Utc;
use sea_orm::{
    ActiveValue, DatabaseTransaction, QueryFilter, QueryOrder, QuerySelect, TransactionTrait,
    prelude::*,
};

use crate::{
    EngineError, Page, ResultEngine, User, UserNew, UserPatch, pages,
    password::{hash_password, validate_new_password, verify_password},
    user_pages, users,
    users::register_failure,
    util::{Pagination, normalize_optional, normalize_required, patch_optional, patch_required},
};

use super::{Engine, paginate, with_tx};

impl Engine {
    pub async fn list_users(&self, pagination: Pagination) -> ResultEngine<Vec<User>> {
        with_tx!(self, |db_tx| {
            let models = paginate(
                users::Entity::find().order_by_asc(users::Column::Id),
                pagination,
            )
            .all(&db_tx)
            .await?;
            Ok(models.into_iter().map(User::from).collect())
        })
    }

    pub async fn user(&self, user_id: i32) -> ResultEngine<User> {
        with_tx!(self, |db_tx| {
            let model = self.require_user(&db_tx, user_id).await?;
            Ok(User::from(model))
        })
    }

    pub async fn user_by_username(&self, username: &str) -> ResultEngine<User> {
        with_tx!(self, |db_tx| {
            self.find_user_by_username(&db_tx, username)
                .await?
                .map(User::from)
                .ok_or_else(|| EngineError::KeyNotFound(format!("user {username}")))
        })
    }

    /// Create a user with a freshly hashed password.
    pub async fn new_user(&self, input: UserNew) -> ResultEngine<User> {
        let username = normalize_required(&input.username, "username")?;
        let email = normalize_required(&input.email, "email")?;
        validate_new_password(&input.password)?;
        let hashed_password = hash_password(&input.password)?;
        with_tx!(self, |db_tx| {
            self.ensure_username_free(&db_tx, &username, None).await?;
            self.ensure_email_free(&db_tx, &email, None).await?;
            if let Some(role_id) = input.role_id {
                self.require_role(&db_tx, role_id).await?;
            }
            let now = Utc::now();
            let model = users::ActiveModel {
                id: ActiveValue::NotSet,
                username: ActiveValue::Set(username),
                email: ActiveValue::Set(email),
                hashed_password: ActiveValue::Set(hashed_password),
                full_name: ActiveValue::Set(normalize_optional(input.full_name.as_deref())),
                active: ActiveValue::Set(input.active),
                is_admin: ActiveValue::Set(input.is_admin),
                role_id: ActiveValue::Set(input.role_id),
                created_at: ActiveValue::Set(now),
                last_login: ActiveValue::Set(None),
                must_change_password: ActiveValue::Set(input.must_change_password),
                password_changed_at: ActiveValue::Set(Some(now)),
                failed_attempts: ActiveValue::Set(0),
                locked_until: ActiveValue::Set(None),
            }
            .insert(&db_tx)
            .await?;
            tracing::info!(user_id = model.id, username = %model.username, "user created");
            Ok(User::from(model))
        })
    }

    pub async fn update_user(&self, user_id: i32, patch: UserPatch) -> ResultEngine<User> {
        with_tx!(self, |db_tx| {
            let current = self.require_user(&db_tx, user_id).await?;
            let mut username = current.username.clone();
            if patch_required(&mut username, patch.username.as_deref(), "username")? {
                self.ensure_username_free(&db_tx, &username, Some(user_id))
                    .await?;
            }
            let mut email = current.email.clone();
            if patch_required(&mut email, patch.email.as_deref(), "email")? {
                self.ensure_email_free(&db_tx, &email, Some(user_id)).await?;
            }
            if let Some(role_id) = patch.role_id {
                self.require_role(&db_tx, role_id).await?;
            }
            let mut full_name = current.full_name.clone();
            patch_optional(&mut full_name, patch.full_name.as_deref());
            let active_flag = patch.active.unwrap_or(current.active);
            let is_admin = patch.is_admin.unwrap_or(current.is_admin);
            let role_id = patch.role_id.or(current.role_id);

            let mut active: users::ActiveModel = current.into();
            active.username = ActiveValue::Set(username);
            active.email = ActiveValue::Set(email);
            active.full_name = ActiveValue::Set(full_name);
            active.active = ActiveValue::Set(active_flag);
            active.is_admin = ActiveValue::Set(is_admin);
            active.role_id = ActiveValue::Set(role_id);
            let model = active.update(&db_tx).await?;
            Ok(User::from(model))
        })
    }

    /// Soft delete. `actor_id` is the admin performing it, who cannot
    /// deactivate their own account.
    pub async fn deactivate_user(&self, user_id: i32, actor_id: i32) -> ResultEngine<()> {
        if user_id == actor_id {
            return Err(EngineError::Invalid(
                "you cannot deactivate your own account".to_string(),
            ));
        }
        self.set_user_active(user_id, false).await
    }

    pub async fn activate_user(&self, user_id: i32) -> ResultEngine<()> {
        self.set_user_active(user_id, true).await
    }

    /// Check credentials, maintaining the lockout counters.
    ///
    /// Returns `None` for unknown, inactive or locked users and for wrong
    /// passwords. The fifth consecutive failure locks the account.
    pub async fn authenticate(&self, username: &str, password: &str) -> ResultEngine<Option<User>> {
        with_tx!(self, |db_tx| {
            let Some(model) = self.find_user_by_username(&db_tx, username).await? else {
                tracing::warn!(username, "login for unknown user");
                return Ok(None);
            };
            let now = Utc::now();
            if model.locked_until.is_some_and(|until| until > now) {
                tracing::warn!(username, "login for locked user");
                return Ok(None);
            }
            if !model.active {
                tracing::warn!(username, "login for inactive user");
                return Ok(None);
            }

            if !verify_password(password, &model.hashed_password) {
                let failure = register_failure(model.failed_attempts, now);
                if failure.locked_until.is_some() {
                    tracing::warn!(username, attempts = failure.attempts, "user locked");
                } else {
                    tracing::warn!(username, attempts = failure.attempts, "wrong password");
                }
                let mut active: users::ActiveModel = model.into();
                active.failed_attempts = ActiveValue::Set(failure.attempts);
                if failure.locked_until.is_some() {
                    active.locked_until = ActiveValue::Set(failure.locked_until);
                }
                active.update(&db_tx).await?;
                Ok(None)
            } else {
                let mut active: users::ActiveModel = model.into();
                active.failed_attempts = ActiveValue::Set(0);
                active.locked_until = ActiveValue::Set(None);
                active.last_login = ActiveValue::Set(Some(now));
                let model = active.update(&db_tx).await?;
                tracing::info!(username, "user logged in");
                Ok(Some(User::from(model)))
            }
        })
    }

    /// Change a user's own password after checking the current one.
    pub async fn change_password(
        &self,
        user_id: i32,
        current_password: &str,
        new_password: &str,
    ) -> ResultEngine<()> {
        validate_new_password(new_password)?;
        with_tx!(self, |db_tx| {
            let model = self.require_user(&db_tx, user_id).await?;
            if !verify_password(current_password, &model.hashed_password) {
                return Err(EngineError::Invalid(
                    "current password is incorrect".to_string(),
                ));
            }
            let hashed_password = hash_password(new_password)?;
            let mut active: users::ActiveModel = model.into();
            active.hashed_password = ActiveValue::Set(hashed_password);
            active.must_change_password = ActiveValue::Set(false);
            active.password_changed_at = ActiveValue::Set(Some(Utc::now()));
            active.failed_attempts = ActiveValue::Set(0);
            active.update(&db_tx).await?;
            tracing::info!(user_id, "password changed");
            Ok(())
        })
    }

    /// Set a new password for a user, clearing any lock.
    pub async fn reset_password(
        &self,
        user_id: i32,
        new_password: &str,
        force_change: bool,
    ) -> ResultEngine<()> {
        validate_new_password(new_password)?;
        let hashed_password = hash_password(new_password)?;
        with_tx!(self, |db_tx| {
            let model = self.require_user(&db_tx, user_id).await?;
            let mut active: users::ActiveModel = model.into();
            active.hashed_password = ActiveValue::Set(hashed_password);
            active.must_change_password = ActiveValue::Set(force_change);
            active.password_changed_at = ActiveValue::Set(Some(Utc::now()));
            active.failed_attempts = ActiveValue::Set(0);
            active.locked_until = ActiveValue::Set(None);
            active.update(&db_tx).await?;
            tracing::info!(user_id, force_change, "password reset");
            Ok(())
        })
    }

    pub async fn unlock_user(&self, user_id: i32) -> ResultEngine<()> {
        with_tx!(self, |db_tx| {
            let model = self.require_user(&db_tx, user_id).await?;
            let mut active: users::ActiveModel = model.into();
            active.failed_attempts = ActiveValue::Set(0);
            active.locked_until = ActiveValue::Set(None);
            active.update(&db_tx).await?;
            tracing::info!(user_id, "user unlocked");
            Ok(())
        })
    }

    /// Replace the pages granted to a user. Every page must exist.
    pub async fn assign_pages(&self, user_id: i32, page_ids: &[i32]) -> ResultEngine<Vec<Page>> {
        with_tx!(self, |db_tx| {
            self.require_user(&db_tx, user_id).await?;
            let mut page_ids = page_ids.to_vec();
            page_ids.sort_unstable();
            page_ids.dedup();
            for page_id in &page_ids {
                self.require_page(&db_tx, *page_id).await?;
            }
            user_pages::Entity::delete_many()
                .filter(user_pages::Column::UserId.eq(user_id))
                .exec(&db_tx)
                .await?;
            if !page_ids.is_empty() {
                user_pages::Entity::insert_many(page_ids.iter().map(|page_id| {
                    user_pages::ActiveModel {
                        user_id: ActiveValue::Set(user_id),
                        page_id: ActiveValue::Set(*page_id),
                    }
                }))
                .exec_without_returning(&db_tx)
                .await?;
            }
            tracing::info!(user_id, pages = page_ids.len(), "pages assigned");
            self.assigned_pages(&db_tx, user_id, false).await
        })
    }

    /// Pages a user can open: every active page for admins, the assigned
    /// active pages for everyone else.
    pub async fn user_pages(&self, user_id: i32) -> ResultEngine<Vec<Page>> {
        with_tx!(self, |db_tx| {
            let model = self.require_user(&db_tx, user_id).await?;
            if model.is_admin {
                let models = pages::Entity::find()
                    .filter(pages::Column::Active.eq(true))
                    .order_by_asc(pages::Column::Order)
                    .all(&db_tx)
                    .await?;
                return Ok(models.into_iter().map(Page::from).collect());
            }
            self.assigned_pages(&db_tx, user_id, true).await
        })
    }

    pub(super) async fn assigned_pages(
        &self,
        db_tx: &DatabaseTransaction,
        user_id: i32,
        only_active: bool,
    ) -> ResultEngine<Vec<Page>> {
        let mut query = pages::Entity::find()
            .inner_join(user_pages::Entity)
            .filter(user_pages::Column::UserId.eq(user_id))
            .order_by_asc(pages::Column::Order);
        if only_active {
            query = query.filter(pages::Column::Active.eq(true));
        }
        let models = query.all(db_tx).await?;
        Ok(models.into_iter().map(Page::from).collect())
    }

    async fn set_user_active(&self, user_id: i32, active_flag: bool) -> ResultEngine<()> {
        with_tx!(self, |db_tx| {
            let model = self.require_user(&db_tx, user_id).await?;
            let mut active: users::ActiveModel = model.into();
            active.active = ActiveValue::Set(active_flag);
            active.update(&db_tx).await?;
            tracing::info!(user_id, active = active_flag, "user activation changed");
            Ok(())
        })
    }

    async fn find_user_by_username(
        &self,
        db_tx: &DatabaseTransaction,
        username: &str,
    ) -> ResultEngine<Option<users::Model>> {
        // Stored usernames are NFKC-normalized.
        let Some(username) = normalize_optional(Some(username)) else {
            return Ok(None);
        };
        users::Entity::find()
            .filter(users::Column::Username.eq(username))
            .one(db_tx)
            .await
            .map_err(Into::into)
    }

    async fn ensure_username_free(
        &self,
        db_tx: &DatabaseTransaction,
        username: &str,
        except: Option<i32>,
    ) -> ResultEngine<()> {
        let mut query = users::Entity::find().filter(users::Column::Username.eq(username));
        if let Some(id) = except {
            query = query.filter(users::Column::Id.ne(id));
        }
        if query.one(db_tx).await?.is_some() {
            return Err(EngineError::ExistingKey(username.to_string()));
        }
        Ok(())
    }

    async fn ensure_email_free(
        &self,
        db_tx: &DatabaseTransaction,
        email: &str,
        except: Option<i32>,
    ) -> ResultEngine<()> {
        let mut query = users::Entity::find().filter(users::Column::Email.eq(email));
        if let Some(id) = except {
            query = query.filter(users::Column::Id.ne(id));
        }
        if query.one(db_tx).await?.is_some() {
            return Err(EngineError::ExistingKey(email.to_string()));
        }
        Ok(())
    }
}

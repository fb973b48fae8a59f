//! Roles, permissions and pages, plus the page guard used by the API.

use std::collections::HashMap;

use chrono::Utc;
use sea_orm::{
    ActiveValue, DatabaseTransaction, PaginatorTrait, QueryFilter, QueryOrder, QuerySelect,
    TransactionTrait, prelude::*,
};

use crate::{
    EngineError, Page, PageNew, PagePatch, Permission, PermissionNew, PermissionPatch,
    ResultEngine, Role, RoleNew, RolePatch, User, pages, permissions, role_permissions, roles,
    user_pages, users,
    util::{Pagination, normalize_optional, normalize_required, patch_optional, patch_required},
};

use super::{Engine, paginate, with_tx};

impl Engine {
    /// Whether `user` may open at least one of `page_names`.
    ///
    /// Admins pass every guard; everyone else needs one of the pages assigned
    /// and active.
    pub async fn has_page_access(&self, user: &User, page_names: &[&str]) -> ResultEngine<bool> {
        if user.is_admin {
            return Ok(true);
        }
        with_tx!(self, |db_tx| {
            let granted = pages::Entity::find()
                .inner_join(user_pages::Entity)
                .filter(user_pages::Column::UserId.eq(user.id))
                .filter(pages::Column::Active.eq(true))
                .filter(pages::Column::Name.is_in(page_names.iter().copied()))
                .count(&db_tx)
                .await?;
            Ok(granted > 0)
        })
    }

    // ── roles ──────────────────────────────────────────────────────────────

    pub async fn list_roles(&self, pagination: Pagination) -> ResultEngine<Vec<Role>> {
        with_tx!(self, |db_tx| {
            let models = paginate(
                roles::Entity::find().order_by_asc(roles::Column::Id),
                pagination,
            )
            .all(&db_tx)
            .await?;
            let ids: Vec<i32> = models.iter().map(|model| model.id).collect();
            let mut grants: HashMap<i32, Vec<Permission>> = HashMap::new();
            for (link, permission) in role_permissions::Entity::find()
                .filter(role_permissions::Column::RoleId.is_in(ids))
                .find_also_related(permissions::Entity)
                .all(&db_tx)
                .await?
            {
                if let Some(permission) = permission {
                    grants
                        .entry(link.role_id)
                        .or_default()
                        .push(Permission::from(permission));
                }
            }
            Ok(models
                .into_iter()
                .map(|model| {
                    let mut granted = grants.remove(&model.id).unwrap_or_default();
                    granted.sort_by_key(|permission| permission.id);
                    Role::from_model(model, granted)
                })
                .collect())
        })
    }

    pub async fn role(&self, role_id: i32) -> ResultEngine<Role> {
        with_tx!(self, |db_tx| {
            let model = self.require_role(&db_tx, role_id).await?;
            self.load_role(&db_tx, model).await
        })
    }

    pub async fn new_role(&self, input: RoleNew) -> ResultEngine<Role> {
        let name = normalize_required(&input.name, "nombre")?;
        with_tx!(self, |db_tx| {
            self.ensure_role_name_free(&db_tx, &name, None).await?;
            let model = roles::ActiveModel {
                id: ActiveValue::NotSet,
                name: ActiveValue::Set(name),
                description: ActiveValue::Set(normalize_optional(input.description.as_deref())),
                active: ActiveValue::Set(input.active),
                created_at: ActiveValue::Set(Utc::now()),
            }
            .insert(&db_tx)
            .await?;
            self.replace_role_permissions(&db_tx, model.id, &input.permission_ids)
                .await?;
            tracing::info!(role_id = model.id, "role created");
            self.load_role(&db_tx, model).await
        })
    }

    pub async fn update_role(&self, role_id: i32, patch: RolePatch) -> ResultEngine<Role> {
        with_tx!(self, |db_tx| {
            let current = self.require_role(&db_tx, role_id).await?;
            let mut name = current.name.clone();
            if patch_required(&mut name, patch.name.as_deref(), "nombre")? {
                self.ensure_role_name_free(&db_tx, &name, Some(role_id))
                    .await?;
            }
            let mut description = current.description.clone();
            patch_optional(&mut description, patch.description.as_deref());
            let active_flag = patch.active.unwrap_or(current.active);
            if let Some(permission_ids) = patch.permission_ids.as_deref() {
                self.replace_role_permissions(&db_tx, role_id, permission_ids)
                    .await?;
            }

            let mut active: roles::ActiveModel = current.into();
            active.name = ActiveValue::Set(name);
            active.description = ActiveValue::Set(description);
            active.active = ActiveValue::Set(active_flag);
            let model = active.update(&db_tx).await?;
            self.load_role(&db_tx, model).await
        })
    }

    /// Soft delete, refused while users hold the role.
    pub async fn delete_role(&self, role_id: i32) -> ResultEngine<()> {
        with_tx!(self, |db_tx| {
            let current = self.require_role(&db_tx, role_id).await?;
            let holders = users::Entity::find()
                .filter(users::Column::RoleId.eq(role_id))
                .count(&db_tx)
                .await?;
            if holders > 0 {
                return Err(EngineError::InUse(format!(
                    "role {} ({holders} users)",
                    current.name
                )));
            }
            let mut active: roles::ActiveModel = current.into();
            active.active = ActiveValue::Set(false);
            active.update(&db_tx).await?;
            tracing::info!(role_id, "role deactivated");
            Ok(())
        })
    }

    async fn load_role(&self, db_tx: &DatabaseTransaction, model: roles::Model) -> ResultEngine<Role> {
        let granted = permissions::Entity::find()
            .inner_join(role_permissions::Entity)
            .filter(role_permissions::Column::RoleId.eq(model.id))
            .order_by_asc(permissions::Column::Id)
            .all(db_tx)
            .await?;
        Ok(Role::from_model(
            model,
            granted.into_iter().map(Permission::from).collect(),
        ))
    }

    async fn replace_role_permissions(
        &self,
        db_tx: &DatabaseTransaction,
        role_id: i32,
        permission_ids: &[i32],
    ) -> ResultEngine<()> {
        let mut permission_ids = permission_ids.to_vec();
        permission_ids.sort_unstable();
        permission_ids.dedup();
        for permission_id in &permission_ids {
            self.require_permission(db_tx, *permission_id).await?;
        }
        role_permissions::Entity::delete_many()
            .filter(role_permissions::Column::RoleId.eq(role_id))
            .exec(db_tx)
            .await?;
        if permission_ids.is_empty() {
            return Ok(());
        }
        role_permissions::Entity::insert_many(permission_ids.into_iter().map(|permission_id| {
            role_permissions::ActiveModel {
                role_id: ActiveValue::Set(role_id),
                permission_id: ActiveValue::Set(permission_id),
            }
        }))
        .exec_without_returning(db_tx)
        .await?;
        Ok(())
    }

    async fn ensure_role_name_free(
        &self,
        db_tx: &DatabaseTransaction,
        name: &str,
        except: Option<i32>,
    ) -> ResultEngine<()> {
        let mut query = roles::Entity::find().filter(roles::Column::Name.eq(name));
        if let Some(id) = except {
            query = query.filter(roles::Column::Id.ne(id));
        }
        if query.one(db_tx).await?.is_some() {
            return Err(EngineError::ExistingKey(name.to_string()));
        }
        Ok(())
    }

    // ── permissions ────────────────────────────────────────────────────────

    pub async fn list_permissions(&self, pagination: Pagination) -> ResultEngine<Vec<Permission>> {
        with_tx!(self, |db_tx| {
            let models = paginate(
                permissions::Entity::find().order_by_asc(permissions::Column::Id),
                pagination,
            )
            .all(&db_tx)
            .await?;
            Ok(models.into_iter().map(Permission::from).collect())
        })
    }

    pub async fn permission(&self, permission_id: i32) -> ResultEngine<Permission> {
        with_tx!(self, |db_tx| {
            let model = self.require_permission(&db_tx, permission_id).await?;
            Ok(Permission::from(model))
        })
    }

    pub async fn new_permission(&self, input: PermissionNew) -> ResultEngine<Permission> {
        let name = normalize_required(&input.name, "nombre")?;
        let resource = normalize_required(&input.resource, "recurso")?;
        let action = normalize_required(&input.action, "accion")?;
        with_tx!(self, |db_tx| {
            self.ensure_permission_name_free(&db_tx, &name, None).await?;
            let model = permissions::ActiveModel {
                id: ActiveValue::NotSet,
                name: ActiveValue::Set(name),
                description: ActiveValue::Set(normalize_optional(input.description.as_deref())),
                resource: ActiveValue::Set(resource),
                action: ActiveValue::Set(action),
                active: ActiveValue::Set(input.active),
            }
            .insert(&db_tx)
            .await?;
            Ok(Permission::from(model))
        })
    }

    pub async fn update_permission(
        &self,
        permission_id: i32,
        patch: PermissionPatch,
    ) -> ResultEngine<Permission> {
        with_tx!(self, |db_tx| {
            let current = self.require_permission(&db_tx, permission_id).await?;
            let mut name = current.name.clone();
            if patch_required(&mut name, patch.name.as_deref(), "nombre")? {
                self.ensure_permission_name_free(&db_tx, &name, Some(permission_id))
                    .await?;
            }
            let mut resource = current.resource.clone();
            patch_required(&mut resource, patch.resource.as_deref(), "recurso")?;
            let mut action = current.action.clone();
            patch_required(&mut action, patch.action.as_deref(), "accion")?;
            let mut description = current.description.clone();
            patch_optional(&mut description, patch.description.as_deref());
            let active_flag = patch.active.unwrap_or(current.active);

            let mut active: permissions::ActiveModel = current.into();
            active.name = ActiveValue::Set(name);
            active.description = ActiveValue::Set(description);
            active.resource = ActiveValue::Set(resource);
            active.action = ActiveValue::Set(action);
            active.active = ActiveValue::Set(active_flag);
            let model = active.update(&db_tx).await?;
            Ok(Permission::from(model))
        })
    }

    pub async fn delete_permission(&self, permission_id: i32) -> ResultEngine<()> {
        with_tx!(self, |db_tx| {
            let current = self.require_permission(&db_tx, permission_id).await?;
            let mut active: permissions::ActiveModel = current.into();
            active.active = ActiveValue::Set(false);
            active.update(&db_tx).await?;
            Ok(())
        })
    }

    async fn ensure_permission_name_free(
        &self,
        db_tx: &DatabaseTransaction,
        name: &str,
        except: Option<i32>,
    ) -> ResultEngine<()> {
        let mut query = permissions::Entity::find().filter(permissions::Column::Name.eq(name));
        if let Some(id) = except {
            query = query.filter(permissions::Column::Id.ne(id));
        }
        if query.one(db_tx).await?.is_some() {
            return Err(EngineError::ExistingKey(name.to_string()));
        }
        Ok(())
    }

    // ── pages ──────────────────────────────────────────────────────────────

    pub async fn list_pages(&self, pagination: Pagination) -> ResultEngine<Vec<Page>> {
        with_tx!(self, |db_tx| {
            let models = paginate(
                pages::Entity::find()
                    .order_by_asc(pages::Column::Order)
                    .order_by_asc(pages::Column::Id),
                pagination,
            )
            .all(&db_tx)
            .await?;
            Ok(models.into_iter().map(Page::from).collect())
        })
    }

    pub async fn page(&self, page_id: i32) -> ResultEngine<Page> {
        with_tx!(self, |db_tx| {
            let model = self.require_page(&db_tx, page_id).await?;
            Ok(Page::from(model))
        })
    }

    pub async fn new_page(&self, input: PageNew) -> ResultEngine<Page> {
        let name = normalize_required(&input.name, "nombre")?;
        let route = normalize_required(&input.route, "ruta")?;
        let title = normalize_required(&input.title, "titulo")?;
        with_tx!(self, |db_tx| {
            self.ensure_page_free(&db_tx, &name, &route, None).await?;
            let model = pages::ActiveModel {
                id: ActiveValue::NotSet,
                name: ActiveValue::Set(name),
                route: ActiveValue::Set(route),
                title: ActiveValue::Set(title),
                description: ActiveValue::Set(normalize_optional(input.description.as_deref())),
                icon: ActiveValue::Set(normalize_optional(input.icon.as_deref())),
                order: ActiveValue::Set(input.order),
                active: ActiveValue::Set(input.active),
                admin_only: ActiveValue::Set(input.admin_only),
            }
            .insert(&db_tx)
            .await?;
            tracing::info!(page_id = model.id, name = %model.name, "page created");
            Ok(Page::from(model))
        })
    }

    pub async fn update_page(&self, page_id: i32, patch: PagePatch) -> ResultEngine<Page> {
        with_tx!(self, |db_tx| {
            let current = self.require_page(&db_tx, page_id).await?;
            let mut name = current.name.clone();
            let mut changed = patch_required(&mut name, patch.name.as_deref(), "nombre")?;
            let mut route = current.route.clone();
            changed |= patch_required(&mut route, patch.route.as_deref(), "ruta")?;
            if changed {
                self.ensure_page_free(&db_tx, &name, &route, Some(page_id))
                    .await?;
            }
            let mut title = current.title.clone();
            patch_required(&mut title, patch.title.as_deref(), "titulo")?;
            let mut description = current.description.clone();
            patch_optional(&mut description, patch.description.as_deref());
            let mut icon = current.icon.clone();
            patch_optional(&mut icon, patch.icon.as_deref());
            let order = patch.order.unwrap_or(current.order);
            let active_flag = patch.active.unwrap_or(current.active);
            let admin_only = patch.admin_only.unwrap_or(current.admin_only);

            let mut active: pages::ActiveModel = current.into();
            active.name = ActiveValue::Set(name);
            active.route = ActiveValue::Set(route);
            active.title = ActiveValue::Set(title);
            active.description = ActiveValue::Set(description);
            active.icon = ActiveValue::Set(icon);
            active.order = ActiveValue::Set(order);
            active.active = ActiveValue::Set(active_flag);
            active.admin_only = ActiveValue::Set(admin_only);
            let model = active.update(&db_tx).await?;
            Ok(Page::from(model))
        })
    }

    pub async fn delete_page(&self, page_id: i32) -> ResultEngine<()> {
        with_tx!(self, |db_tx| {
            let current = self.require_page(&db_tx, page_id).await?;
            let mut active: pages::ActiveModel = current.into();
            active.active = ActiveValue::Set(false);
            active.update(&db_tx).await?;
            tracing::info!(page_id, "page deactivated");
            Ok(())
        })
    }

    async fn ensure_page_free(
        &self,
        db_tx: &DatabaseTransaction,
        name: &str,
        route: &str,
        except: Option<i32>,
    ) -> ResultEngine<()> {
        let mut query = pages::Entity::find().filter(
            sea_orm::Condition::any()
                .add(pages::Column::Name.eq(name))
                .add(pages::Column::Route.eq(route)),
        );
        if let Some(id) = except {
            query = query.filter(pages::Column::Id.ne(id));
        }
        if let Some(existing) = query.one(db_tx).await? {
            let taken = if existing.name == name { name } else { route };
            return Err(EngineError::ExistingKey(taken.to_string()));
        }
        Ok(())
    }
}

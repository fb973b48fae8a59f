use sea_orm::{
    ActiveValue, DatabaseTransaction, PaginatorTrait, QueryFilter, QueryOrder, TransactionTrait,
    prelude::*,
};

use crate::{
    EngineError, ResultEngine, Supplier, SupplierNew, SupplierPatch, parts, purchase_orders,
    suppliers,
    util::{Pagination, normalize_optional, normalize_required, patch_optional, patch_required},
};

use super::{Engine, paginate, with_tx};

impl Engine {
    pub async fn list_suppliers(&self, pagination: Pagination) -> ResultEngine<Vec<Supplier>> {
        with_tx!(self, |db_tx| {
            let models = paginate(
                suppliers::Entity::find().order_by_asc(suppliers::Column::Id),
                pagination,
            )
            .all(&db_tx)
            .await?;
            Ok(models.into_iter().map(Supplier::from).collect())
        })
    }

    pub async fn supplier(&self, supplier_id: i32) -> ResultEngine<Supplier> {
        with_tx!(self, |db_tx| {
            let model = self.require_supplier(&db_tx, supplier_id).await?;
            Ok(Supplier::from(model))
        })
    }

    /// Create a supplier. Names are unique after normalization.
    pub async fn new_supplier(&self, input: SupplierNew) -> ResultEngine<Supplier> {
        let name = normalize_required(&input.name, "nombre")?;
        with_tx!(self, |db_tx| {
            self.ensure_supplier_name_free(&db_tx, &name, None).await?;
            let model = suppliers::ActiveModel {
                id: ActiveValue::NotSet,
                name: ActiveValue::Set(name),
                contact: ActiveValue::Set(normalize_optional(input.contact.as_deref())),
                phone: ActiveValue::Set(normalize_optional(input.phone.as_deref())),
                email: ActiveValue::Set(normalize_optional(input.email.as_deref())),
            }
            .insert(&db_tx)
            .await?;
            tracing::info!(supplier_id = model.id, "supplier created");
            Ok(Supplier::from(model))
        })
    }

    pub async fn update_supplier(
        &self,
        supplier_id: i32,
        patch: SupplierPatch,
    ) -> ResultEngine<Supplier> {
        with_tx!(self, |db_tx| {
            let model = self.require_supplier(&db_tx, supplier_id).await?;
            let mut name = model.name.clone();
            let renamed = patch_required(&mut name, patch.name.as_deref(), "nombre")?;
            if renamed {
                self.ensure_supplier_name_free(&db_tx, &name, Some(supplier_id))
                    .await?;
            }
            let mut contact = model.contact.clone();
            patch_optional(&mut contact, patch.contact.as_deref());
            let mut phone = model.phone.clone();
            patch_optional(&mut phone, patch.phone.as_deref());
            let mut email = model.email.clone();
            patch_optional(&mut email, patch.email.as_deref());

            let mut active: suppliers::ActiveModel = model.into();
            active.name = ActiveValue::Set(name);
            active.contact = ActiveValue::Set(contact);
            active.phone = ActiveValue::Set(phone);
            active.email = ActiveValue::Set(email);
            let model = active.update(&db_tx).await?;
            Ok(Supplier::from(model))
        })
    }

    /// Delete a supplier that no part or purchase order references.
    pub async fn delete_supplier(&self, supplier_id: i32) -> ResultEngine<()> {
        with_tx!(self, |db_tx| {
            self.require_supplier(&db_tx, supplier_id).await?;
            let parts = parts::Entity::find()
                .filter(parts::Column::SupplierId.eq(supplier_id))
                .count(&db_tx)
                .await?;
            let orders = purchase_orders::Entity::find()
                .filter(purchase_orders::Column::SupplierId.eq(supplier_id))
                .count(&db_tx)
                .await?;
            if parts > 0 || orders > 0 {
                return Err(EngineError::InUse(format!(
                    "supplier {supplier_id} ({parts} parts, {orders} purchase orders)"
                )));
            }
            suppliers::Entity::delete_by_id(supplier_id)
                .exec(&db_tx)
                .await?;
            tracing::info!(supplier_id, "supplier deleted");
            Ok(())
        })
    }

    async fn ensure_supplier_name_free(
        &self,
        db_tx: &DatabaseTransaction,
        name: &str,
        except: Option<i32>,
    ) -> ResultEngine<()> {
        let mut query = suppliers::Entity::find().filter(suppliers::Column::Name.eq(name));
        if let Some(id) = except {
            query = query.filter(suppliers::Column::Id.ne(id));
        }
        if query.one(db_tx).await?.is_some() {
            return Err(EngineError::ExistingKey(name.to_string()));
        }
        Ok(())
    }
}

use sea_orm::{DatabaseConnection, DatabaseTransaction, EntityTrait, QuerySelect, Select};

use crate::{EngineError, ResultEngine, util::Pagination};

mod access;
mod machines;
mod parts;
mod purchase_orders;
mod receiving;
mod storage;
mod suppliers;
mod usage;
mod users;
mod work_orders;

/// Run a block inside a DB transaction, committing on success and rolling back on error.
macro_rules! with_tx {
    ($self:expr, |$tx:ident| $body:expr) => {{
        let $tx = $self.database.begin().await?;
        let result = $body;
        match result {
            Ok(value) => {
                $tx.commit().await?;
                Ok(value)
            }
            Err(err) => Err(err),
        }
    }};
}

pub(crate) use with_tx;

/// Generates a `require_*` lookup that fails with `KeyNotFound` when the row
/// is missing.
macro_rules! impl_require {
    ($fn_name:ident, $entity:ty, $model:ty, $label:literal) => {
        pub(crate) async fn $fn_name(
            &self,
            db: &DatabaseTransaction,
            id: i32,
        ) -> ResultEngine<$model> {
            <$entity>::find_by_id(id)
                .one(db)
                .await?
                .ok_or_else(|| EngineError::KeyNotFound(format!("{} {id}", $label)))
        }
    };
}

#[derive(Debug)]
pub struct Engine {
    database: DatabaseConnection,
}

impl Engine {
    /// Return a builder for `Engine`. Help to build the struct.
    pub fn builder() -> EngineBuilder {
        EngineBuilder::default()
    }

    impl_require!(
        require_supplier,
        crate::suppliers::Entity,
        crate::suppliers::Model,
        "supplier"
    );
    impl_require!(
        require_machine_model,
        crate::machine_models::Entity,
        crate::machine_models::Model,
        "machine model"
    );
    impl_require!(
        require_machine,
        crate::machines::Entity,
        crate::machines::Model,
        "machine"
    );
    impl_require!(
        require_storage,
        crate::storage_locations::Entity,
        crate::storage_locations::Model,
        "storage location"
    );
    impl_require!(
        require_part,
        crate::parts::Entity,
        crate::parts::Model,
        "part"
    );
    impl_require!(
        require_purchase_order,
        crate::purchase_orders::Entity,
        crate::purchase_orders::Model,
        "purchase order"
    );
    impl_require!(
        require_order_item,
        crate::purchase_order_items::Entity,
        crate::purchase_order_items::Model,
        "order item"
    );
    impl_require!(
        require_work_order,
        crate::work_orders::Entity,
        crate::work_orders::Model,
        "work order"
    );
    impl_require!(
        require_comment,
        crate::work_order_comments::Entity,
        crate::work_order_comments::Model,
        "comment"
    );
    impl_require!(
        require_work_order_file,
        crate::work_order_files::Entity,
        crate::work_order_files::Model,
        "file"
    );
    impl_require!(
        require_user,
        crate::users::Entity,
        crate::users::Model,
        "user"
    );
    impl_require!(
        require_role,
        crate::roles::Entity,
        crate::roles::Model,
        "role"
    );
    impl_require!(
        require_permission,
        crate::permissions::Entity,
        crate::permissions::Model,
        "permission"
    );
    impl_require!(
        require_page,
        crate::pages::Entity,
        crate::pages::Model,
        "page"
    );
}

/// Apply offset pagination to a select.
fn paginate<E: EntityTrait>(select: Select<E>, pagination: Pagination) -> Select<E> {
    select.offset(pagination.skip).limit(pagination.limit)
}

/// The builder for `Engine`
#[derive(Default)]
pub struct EngineBuilder {
    database: DatabaseConnection,
}

impl EngineBuilder {
    /// Pass the required database
    pub fn database(mut self, db: DatabaseConnection) -> EngineBuilder {
        self.database = db;
        self
    }

    /// Construct `Engine`
    pub async fn build(self) -> ResultEngine<Engine> {
        Ok(Engine {
            database: self.database,
        })
    }
}

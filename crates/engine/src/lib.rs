//! Data access and business rules for the Mantia maintenance backend.
//!
//! Every public operation lives on [`Engine`] and runs inside a single
//! database transaction.

pub use error::EngineError;
pub use machine_models::{MachineModel, MachineModelNew, MachineModelPatch};
pub use machines::{Machine, MachineNew, MachinePatch};
pub use ops::{Engine, EngineBuilder};
pub use order_documents::{OrderDocument, OrderDocumentNew};
pub use pages::{Page, PageNew, PagePatch};
pub use part_usage::{ConsumptionStats, PartUsage, PartUsageNew, PartUsagePatch};
pub use parts::{DEFAULT_LOW_STOCK_THRESHOLD, Part, PartNew, PartPatch};
pub use password::{hash_password, verify_password};
pub use permissions::{Permission, PermissionNew, PermissionPatch};
pub use purchase_order_items::{OrderItem, OrderItemNew, OrderItemPatch, ReceivedItem};
pub use purchase_orders::{
    OrderState, OrderStats, PurchaseOrder, PurchaseOrderNew, PurchaseOrderPatch,
};
pub use roles::{Role, RoleNew, RolePatch};
pub use storage_locations::{StorageLocation, StorageLocationNew, StorageLocationPatch};
pub use suppliers::{Supplier, SupplierNew, SupplierPatch};
pub use users::{LOCKOUT_MINUTES, MAX_FAILED_ATTEMPTS, User, UserNew, UserPatch};
pub use util::{DEFAULT_LIMIT, Pagination};
pub use work_order_comments::WorkOrderComment;
pub use work_order_files::{WorkOrderFile, WorkOrderFileNew};
pub use work_orders::{
    Criticality, WorkOrder, WorkOrderFilter, WorkOrderNew, WorkOrderPatch, WorkOrderSort,
    WorkOrderState, WorkOrderStats,
};

mod error;
mod machine_models;
mod machines;
mod ops;
mod order_documents;
mod pages;
mod part_usage;
mod parts;
mod password;
mod permissions;
mod purchase_order_items;
mod purchase_orders;
mod role_permissions;
mod roles;
mod storage_locations;
mod suppliers;
mod user_pages;
mod users;
mod util;
mod work_order_comments;
mod work_order_files;
mod work_orders;

type ResultEngine<T> = Result<T, EngineError>;

//! Initial schema migration - creates all tables from scratch.
//!
//! It creates the complete schema for Mantia:
//!
//! - `roles`, `permisos`, `rol_permisos`: role based permissions
//! - `usuarios`: authentication, lockout state and role
//! - `paginas`, `usuario_paginas`: page based access per user
//! - `proveedores`: suppliers
//! - `modelos_maquinas`, `maquinas`: machine catalog
//! - `almacenamientos`: storage locations
//! - `repuestos`: spare parts inventory
//! - `historial_repuestos`: part usage ledger
//! - `ordenes_compra`, `items_orden_compra`, `documentos_orden`: purchase orders
//! - `ordenes_trabajo`, `comentarios_ot`, `archivos_ot`: maintenance work orders

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

// ─────────────────────────────────────────────────────────────────────────────
// Table identifiers
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Iden)]
enum Roles {
    Table,
    Id,
    Nombre,
    Descripcion,
    Activo,
    FechaCreacion,
}

#[derive(Iden)]
enum Permisos {
    Table,
    Id,
    Nombre,
    Descripcion,
    Recurso,
    Accion,
    Activo,
}

#[derive(Iden)]
enum RolPermisos {
    Table,
    RolId,
    PermisoId,
}

#[derive(Iden)]
enum Usuarios {
    Table,
    Id,
    Username,
    Email,
    HashedPassword,
    NombreCompleto,
    Activo,
    EsAdmin,
    RolId,
    FechaCreacion,
    UltimaConexion,
    DebeCambiarPassword,
    FechaCambioPassword,
    IntentosFallidos,
    BloqueadoHasta,
}

#[derive(Iden)]
enum Paginas {
    Table,
    Id,
    Nombre,
    Ruta,
    Titulo,
    Descripcion,
    Icono,
    Orden,
    Activa,
    SoloAdmin,
}

#[derive(Iden)]
enum UsuarioPaginas {
    Table,
    UsuarioId,
    PaginaId,
}

#[derive(Iden)]
enum Proveedores {
    Table,
    Id,
    Nombre,
    Contacto,
    Telefono,
    Email,
}

#[derive(Iden)]
enum ModelosMaquinas {
    Table,
    Id,
    Fabricante,
    Modelo,
    Detalle,
}

#[derive(Iden)]
enum Maquinas {
    Table,
    Id,
    ModeloId,
    NumeroSerie,
    Alias,
    Ubicacion,
}

#[derive(Iden)]
enum Almacenamientos {
    Table,
    Id,
    Codigo,
    Nombre,
    Descripcion,
    UbicacionFisica,
    Activo,
}

#[derive(Iden)]
enum Repuestos {
    Table,
    Id,
    Codigo,
    Nombre,
    Detalle,
    Ubicacion,
    AlmacenamientoId,
    Cantidad,
    CantidadMinima,
    ProveedorId,
    Tipo,
    DescripcionAduana,
}

#[derive(Iden)]
enum HistorialRepuestos {
    Table,
    Id,
    RepuestoId,
    MaquinaId,
    CantidadUsada,
    Fecha,
    Observaciones,
}

#[derive(Iden)]
enum OrdenesCompra {
    Table,
    Id,
    ProveedorId,
    Estado,
    NumeroRequisicion,
    Legajo,
    Observaciones,
    UsuarioCreadorId,
    FechaCreacion,
    FechaActualizacion,
}

#[derive(Iden)]
enum ItemsOrdenCompra {
    Table,
    Id,
    OrdenId,
    RepuestoId,
    CantidadPedida,
    CantidadRecibida,
    DescripcionAduana,
    PrecioUnitario,
    EsItemManual,
    NombreManual,
    CodigoManual,
    DetalleManual,
    CantidadMinimaManual,
}

#[derive(Iden)]
enum DocumentosOrden {
    Table,
    Id,
    OrdenId,
    NombreArchivo,
    RutaArchivo,
    TipoArchivo,
    TamanoArchivo,
    UsuarioSubidaId,
    FechaSubida,
}

#[derive(Iden)]
enum OrdenesTrabajo {
    Table,
    Id,
    Titulo,
    Descripcion,
    MaquinaId,
    UsuarioAsignadoId,
    UsuarioCreadorId,
    NivelCriticidad,
    Estado,
    FechaProgramada,
    TiempoEstimadoHoras,
    FechaCreacion,
    FechaInicio,
    FechaFinalizacion,
}

#[derive(Iden)]
enum ComentariosOt {
    Table,
    Id,
    OrdenTrabajoId,
    UsuarioId,
    Comentario,
    FechaCreacion,
}

#[derive(Iden)]
enum ArchivosOt {
    Table,
    Id,
    OrdenTrabajoId,
    ComentarioId,
    UsuarioId,
    NombreArchivo,
    NombreArchivoSistema,
    RutaArchivo,
    TipoMime,
    TamanoBytes,
    FechaSubida,
}

fn id_col<T: IntoIden>(col: T) -> ColumnDef {
    ColumnDef::new(col)
        .integer()
        .not_null()
        .auto_increment()
        .primary_key()
        .to_owned()
}

// ─────────────────────────────────────────────────────────────────────────────
// Migration implementation
// ─────────────────────────────────────────────────────────────────────────────

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // ───────────────────────────────────────────────────────────────────
        // 1. Roles and permissions
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(Roles::Table)
                    .if_not_exists()
                    .col(&mut id_col(Roles::Id))
                    .col(ColumnDef::new(Roles::Nombre).string().not_null().unique_key())
                    .col(ColumnDef::new(Roles::Descripcion).string())
                    .col(ColumnDef::new(Roles::Activo).boolean().not_null().default(true))
                    .col(
                        ColumnDef::new(Roles::FechaCreacion)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Permisos::Table)
                    .if_not_exists()
                    .col(&mut id_col(Permisos::Id))
                    .col(
                        ColumnDef::new(Permisos::Nombre)
                            .string()
                            .not_null()
                            .unique_key(),
                    )
                    .col(ColumnDef::new(Permisos::Descripcion).string())
                    .col(ColumnDef::new(Permisos::Recurso).string().not_null())
                    .col(ColumnDef::new(Permisos::Accion).string().not_null())
                    .col(
                        ColumnDef::new(Permisos::Activo)
                            .boolean()
                            .not_null()
                            .default(true),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(RolPermisos::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(RolPermisos::RolId).integer().not_null())
                    .col(ColumnDef::new(RolPermisos::PermisoId).integer().not_null())
                    .primary_key(
                        Index::create()
                            .col(RolPermisos::RolId)
                            .col(RolPermisos::PermisoId),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-rol_permisos-rol_id")
                            .from(RolPermisos::Table, RolPermisos::RolId)
                            .to(Roles::Table, Roles::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-rol_permisos-permiso_id")
                            .from(RolPermisos::Table, RolPermisos::PermisoId)
                            .to(Permisos::Table, Permisos::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // ───────────────────────────────────────────────────────────────────
        // 2. Users
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(Usuarios::Table)
                    .if_not_exists()
                    .col(&mut id_col(Usuarios::Id))
                    .col(
                        ColumnDef::new(Usuarios::Username)
                            .string()
                            .not_null()
                            .unique_key(),
                    )
                    .col(ColumnDef::new(Usuarios::Email).string().not_null().unique_key())
                    .col(ColumnDef::new(Usuarios::HashedPassword).string().not_null())
                    .col(ColumnDef::new(Usuarios::NombreCompleto).string())
                    .col(
                        ColumnDef::new(Usuarios::Activo)
                            .boolean()
                            .not_null()
                            .default(true),
                    )
                    .col(
                        ColumnDef::new(Usuarios::EsAdmin)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(ColumnDef::new(Usuarios::RolId).integer())
                    .col(
                        ColumnDef::new(Usuarios::FechaCreacion)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(ColumnDef::new(Usuarios::UltimaConexion).timestamp_with_time_zone())
                    .col(
                        ColumnDef::new(Usuarios::DebeCambiarPassword)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(Usuarios::FechaCambioPassword)
                            .timestamp_with_time_zone(),
                    )
                    .col(
                        ColumnDef::new(Usuarios::IntentosFallidos)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(ColumnDef::new(Usuarios::BloqueadoHasta).timestamp_with_time_zone())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-usuarios-rol_id")
                            .from(Usuarios::Table, Usuarios::RolId)
                            .to(Roles::Table, Roles::Id),
                    )
                    .to_owned(),
            )
            .await?;

        // ───────────────────────────────────────────────────────────────────
        // 3. Pages
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(Paginas::Table)
                    .if_not_exists()
                    .col(&mut id_col(Paginas::Id))
                    .col(ColumnDef::new(Paginas::Nombre).string().not_null().unique_key())
                    .col(ColumnDef::new(Paginas::Ruta).string().not_null().unique_key())
                    .col(ColumnDef::new(Paginas::Titulo).string().not_null())
                    .col(ColumnDef::new(Paginas::Descripcion).string())
                    .col(ColumnDef::new(Paginas::Icono).string())
                    .col(ColumnDef::new(Paginas::Orden).integer().not_null().default(0))
                    .col(
                        ColumnDef::new(Paginas::Activa)
                            .boolean()
                            .not_null()
                            .default(true),
                    )
                    .col(
                        ColumnDef::new(Paginas::SoloAdmin)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(UsuarioPaginas::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(UsuarioPaginas::UsuarioId).integer().not_null())
                    .col(ColumnDef::new(UsuarioPaginas::PaginaId).integer().not_null())
                    .primary_key(
                        Index::create()
                            .col(UsuarioPaginas::UsuarioId)
                            .col(UsuarioPaginas::PaginaId),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-usuario_paginas-usuario_id")
                            .from(UsuarioPaginas::Table, UsuarioPaginas::UsuarioId)
                            .to(Usuarios::Table, Usuarios::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-usuario_paginas-pagina_id")
                            .from(UsuarioPaginas::Table, UsuarioPaginas::PaginaId)
                            .to(Paginas::Table, Paginas::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // ───────────────────────────────────────────────────────────────────
        // 4. Suppliers
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(Proveedores::Table)
                    .if_not_exists()
                    .col(&mut id_col(Proveedores::Id))
                    .col(
                        ColumnDef::new(Proveedores::Nombre)
                            .string()
                            .not_null()
                            .unique_key(),
                    )
                    .col(ColumnDef::new(Proveedores::Contacto).string())
                    .col(ColumnDef::new(Proveedores::Telefono).string())
                    .col(ColumnDef::new(Proveedores::Email).string())
                    .to_owned(),
            )
            .await?;

        // ───────────────────────────────────────────────────────────────────
        // 5. Machine models and machines
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(ModelosMaquinas::Table)
                    .if_not_exists()
                    .col(&mut id_col(ModelosMaquinas::Id))
                    .col(ColumnDef::new(ModelosMaquinas::Fabricante).string())
                    .col(ColumnDef::new(ModelosMaquinas::Modelo).string().not_null())
                    .col(ColumnDef::new(ModelosMaquinas::Detalle).text())
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-modelos_maquinas-fabricante-modelo-unique")
                    .table(ModelosMaquinas::Table)
                    .col(ModelosMaquinas::Fabricante)
                    .col(ModelosMaquinas::Modelo)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Maquinas::Table)
                    .if_not_exists()
                    .col(&mut id_col(Maquinas::Id))
                    .col(ColumnDef::new(Maquinas::ModeloId).integer())
                    .col(
                        ColumnDef::new(Maquinas::NumeroSerie)
                            .string()
                            .not_null()
                            .unique_key(),
                    )
                    .col(ColumnDef::new(Maquinas::Alias).string())
                    .col(ColumnDef::new(Maquinas::Ubicacion).string())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-maquinas-modelo_id")
                            .from(Maquinas::Table, Maquinas::ModeloId)
                            .to(ModelosMaquinas::Table, ModelosMaquinas::Id),
                    )
                    .to_owned(),
            )
            .await?;

        // ───────────────────────────────────────────────────────────────────
        // 6. Storage locations
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(Almacenamientos::Table)
                    .if_not_exists()
                    .col(&mut id_col(Almacenamientos::Id))
                    .col(
                        ColumnDef::new(Almacenamientos::Codigo)
                            .string()
                            .not_null()
                            .unique_key(),
                    )
                    .col(ColumnDef::new(Almacenamientos::Nombre).string().not_null())
                    .col(ColumnDef::new(Almacenamientos::Descripcion).text())
                    .col(ColumnDef::new(Almacenamientos::UbicacionFisica).string())
                    .col(
                        ColumnDef::new(Almacenamientos::Activo)
                            .boolean()
                            .not_null()
                            .default(true),
                    )
                    .to_owned(),
            )
            .await?;

        // ───────────────────────────────────────────────────────────────────
        // 7. Parts
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(Repuestos::Table)
                    .if_not_exists()
                    .col(&mut id_col(Repuestos::Id))
                    .col(
                        ColumnDef::new(Repuestos::Codigo)
                            .string()
                            .not_null()
                            .unique_key(),
                    )
                    .col(ColumnDef::new(Repuestos::Nombre).string().not_null())
                    .col(ColumnDef::new(Repuestos::Detalle).text())
                    .col(ColumnDef::new(Repuestos::Ubicacion).string())
                    .col(ColumnDef::new(Repuestos::AlmacenamientoId).integer())
                    .col(
                        ColumnDef::new(Repuestos::Cantidad)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(ColumnDef::new(Repuestos::CantidadMinima).integer())
                    .col(ColumnDef::new(Repuestos::ProveedorId).integer())
                    .col(ColumnDef::new(Repuestos::Tipo).string())
                    .col(ColumnDef::new(Repuestos::DescripcionAduana).text())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-repuestos-proveedor_id")
                            .from(Repuestos::Table, Repuestos::ProveedorId)
                            .to(Proveedores::Table, Proveedores::Id),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-repuestos-almacenamiento_id")
                            .from(Repuestos::Table, Repuestos::AlmacenamientoId)
                            .to(Almacenamientos::Table, Almacenamientos::Id),
                    )
                    .to_owned(),
            )
            .await?;

        // ───────────────────────────────────────────────────────────────────
        // 8. Part usage history
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(HistorialRepuestos::Table)
                    .if_not_exists()
                    .col(&mut id_col(HistorialRepuestos::Id))
                    .col(
                        ColumnDef::new(HistorialRepuestos::RepuestoId)
                            .integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(HistorialRepuestos::MaquinaId)
                            .integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(HistorialRepuestos::CantidadUsada)
                            .integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(HistorialRepuestos::Fecha)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(ColumnDef::new(HistorialRepuestos::Observaciones).text())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-historial_repuestos-repuesto_id")
                            .from(HistorialRepuestos::Table, HistorialRepuestos::RepuestoId)
                            .to(Repuestos::Table, Repuestos::Id),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-historial_repuestos-maquina_id")
                            .from(HistorialRepuestos::Table, HistorialRepuestos::MaquinaId)
                            .to(Maquinas::Table, Maquinas::Id),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-historial_repuestos-repuesto_id-fecha")
                    .table(HistorialRepuestos::Table)
                    .col(HistorialRepuestos::RepuestoId)
                    .col(HistorialRepuestos::Fecha)
                    .to_owned(),
            )
            .await?;

        // ───────────────────────────────────────────────────────────────────
        // 9. Purchase orders
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(OrdenesCompra::Table)
                    .if_not_exists()
                    .col(&mut id_col(OrdenesCompra::Id))
                    .col(ColumnDef::new(OrdenesCompra::ProveedorId).integer())
                    .col(
                        ColumnDef::new(OrdenesCompra::Estado)
                            .string()
                            .not_null()
                            .default("borrador"),
                    )
                    .col(
                        ColumnDef::new(OrdenesCompra::NumeroRequisicion)
                            .string()
                            .unique_key(),
                    )
                    .col(ColumnDef::new(OrdenesCompra::Legajo).string())
                    .col(ColumnDef::new(OrdenesCompra::Observaciones).text())
                    .col(ColumnDef::new(OrdenesCompra::UsuarioCreadorId).integer())
                    .col(
                        ColumnDef::new(OrdenesCompra::FechaCreacion)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(OrdenesCompra::FechaActualizacion)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-ordenes_compra-proveedor_id")
                            .from(OrdenesCompra::Table, OrdenesCompra::ProveedorId)
                            .to(Proveedores::Table, Proveedores::Id),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-ordenes_compra-usuario_creador_id")
                            .from(OrdenesCompra::Table, OrdenesCompra::UsuarioCreadorId)
                            .to(Usuarios::Table, Usuarios::Id),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(ItemsOrdenCompra::Table)
                    .if_not_exists()
                    .col(&mut id_col(ItemsOrdenCompra::Id))
                    .col(ColumnDef::new(ItemsOrdenCompra::OrdenId).integer().not_null())
                    .col(ColumnDef::new(ItemsOrdenCompra::RepuestoId).integer())
                    .col(
                        ColumnDef::new(ItemsOrdenCompra::CantidadPedida)
                            .integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(ItemsOrdenCompra::CantidadRecibida)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(ColumnDef::new(ItemsOrdenCompra::DescripcionAduana).text())
                    .col(ColumnDef::new(ItemsOrdenCompra::PrecioUnitario).double())
                    .col(
                        ColumnDef::new(ItemsOrdenCompra::EsItemManual)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(ColumnDef::new(ItemsOrdenCompra::NombreManual).string())
                    .col(ColumnDef::new(ItemsOrdenCompra::CodigoManual).string())
                    .col(ColumnDef::new(ItemsOrdenCompra::DetalleManual).text())
                    .col(ColumnDef::new(ItemsOrdenCompra::CantidadMinimaManual).integer())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-items_orden_compra-orden_id")
                            .from(ItemsOrdenCompra::Table, ItemsOrdenCompra::OrdenId)
                            .to(OrdenesCompra::Table, OrdenesCompra::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-items_orden_compra-repuesto_id")
                            .from(ItemsOrdenCompra::Table, ItemsOrdenCompra::RepuestoId)
                            .to(Repuestos::Table, Repuestos::Id),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(DocumentosOrden::Table)
                    .if_not_exists()
                    .col(&mut id_col(DocumentosOrden::Id))
                    .col(ColumnDef::new(DocumentosOrden::OrdenId).integer().not_null())
                    .col(
                        ColumnDef::new(DocumentosOrden::NombreArchivo)
                            .string()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(DocumentosOrden::RutaArchivo)
                            .string()
                            .not_null(),
                    )
                    .col(ColumnDef::new(DocumentosOrden::TipoArchivo).string().not_null())
                    .col(
                        ColumnDef::new(DocumentosOrden::TamanoArchivo)
                            .big_integer()
                            .not_null(),
                    )
                    .col(ColumnDef::new(DocumentosOrden::UsuarioSubidaId).integer())
                    .col(
                        ColumnDef::new(DocumentosOrden::FechaSubida)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-documentos_orden-orden_id")
                            .from(DocumentosOrden::Table, DocumentosOrden::OrdenId)
                            .to(OrdenesCompra::Table, OrdenesCompra::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // ───────────────────────────────────────────────────────────────────
        // 10. Work orders
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(OrdenesTrabajo::Table)
                    .if_not_exists()
                    .col(&mut id_col(OrdenesTrabajo::Id))
                    .col(ColumnDef::new(OrdenesTrabajo::Titulo).string().not_null())
                    .col(ColumnDef::new(OrdenesTrabajo::Descripcion).text())
                    .col(ColumnDef::new(OrdenesTrabajo::MaquinaId).integer().not_null())
                    .col(
                        ColumnDef::new(OrdenesTrabajo::UsuarioAsignadoId)
                            .integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(OrdenesTrabajo::UsuarioCreadorId)
                            .integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(OrdenesTrabajo::NivelCriticidad)
                            .string()
                            .not_null()
                            .default("media"),
                    )
                    .col(
                        ColumnDef::new(OrdenesTrabajo::Estado)
                            .string()
                            .not_null()
                            .default("pendiente"),
                    )
                    .col(
                        ColumnDef::new(OrdenesTrabajo::FechaProgramada)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(ColumnDef::new(OrdenesTrabajo::TiempoEstimadoHoras).double())
                    .col(
                        ColumnDef::new(OrdenesTrabajo::FechaCreacion)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(ColumnDef::new(OrdenesTrabajo::FechaInicio).timestamp_with_time_zone())
                    .col(
                        ColumnDef::new(OrdenesTrabajo::FechaFinalizacion)
                            .timestamp_with_time_zone(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-ordenes_trabajo-maquina_id")
                            .from(OrdenesTrabajo::Table, OrdenesTrabajo::MaquinaId)
                            .to(Maquinas::Table, Maquinas::Id),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-ordenes_trabajo-usuario_asignado_id")
                            .from(OrdenesTrabajo::Table, OrdenesTrabajo::UsuarioAsignadoId)
                            .to(Usuarios::Table, Usuarios::Id),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-ordenes_trabajo-usuario_creador_id")
                            .from(OrdenesTrabajo::Table, OrdenesTrabajo::UsuarioCreadorId)
                            .to(Usuarios::Table, Usuarios::Id),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(ComentariosOt::Table)
                    .if_not_exists()
                    .col(&mut id_col(ComentariosOt::Id))
                    .col(
                        ColumnDef::new(ComentariosOt::OrdenTrabajoId)
                            .integer()
                            .not_null(),
                    )
                    .col(ColumnDef::new(ComentariosOt::UsuarioId).integer().not_null())
                    .col(ColumnDef::new(ComentariosOt::Comentario).text().not_null())
                    .col(
                        ColumnDef::new(ComentariosOt::FechaCreacion)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-comentarios_ot-orden_trabajo_id")
                            .from(ComentariosOt::Table, ComentariosOt::OrdenTrabajoId)
                            .to(OrdenesTrabajo::Table, OrdenesTrabajo::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-comentarios_ot-usuario_id")
                            .from(ComentariosOt::Table, ComentariosOt::UsuarioId)
                            .to(Usuarios::Table, Usuarios::Id),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(ArchivosOt::Table)
                    .if_not_exists()
                    .col(&mut id_col(ArchivosOt::Id))
                    .col(ColumnDef::new(ArchivosOt::OrdenTrabajoId).integer().not_null())
                    .col(ColumnDef::new(ArchivosOt::ComentarioId).integer())
                    .col(ColumnDef::new(ArchivosOt::UsuarioId).integer().not_null())
                    .col(ColumnDef::new(ArchivosOt::NombreArchivo).string().not_null())
                    .col(
                        ColumnDef::new(ArchivosOt::NombreArchivoSistema)
                            .string()
                            .not_null(),
                    )
                    .col(ColumnDef::new(ArchivosOt::RutaArchivo).string().not_null())
                    .col(ColumnDef::new(ArchivosOt::TipoMime).string())
                    .col(ColumnDef::new(ArchivosOt::TamanoBytes).big_integer().not_null())
                    .col(
                        ColumnDef::new(ArchivosOt::FechaSubida)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-archivos_ot-orden_trabajo_id")
                            .from(ArchivosOt::Table, ArchivosOt::OrdenTrabajoId)
                            .to(OrdenesTrabajo::Table, OrdenesTrabajo::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-archivos_ot-comentario_id")
                            .from(ArchivosOt::Table, ArchivosOt::ComentarioId)
                            .to(ComentariosOt::Table, ComentariosOt::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-archivos_ot-usuario_id")
                            .from(ArchivosOt::Table, ArchivosOt::UsuarioId)
                            .to(Usuarios::Table, Usuarios::Id),
                    )
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // Drop in reverse order of creation (respecting FK dependencies)
        manager
            .drop_table(Table::drop().table(ArchivosOt::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(ComentariosOt::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(OrdenesTrabajo::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(DocumentosOrden::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(ItemsOrdenCompra::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(OrdenesCompra::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(HistorialRepuestos::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Repuestos::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Almacenamientos::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Maquinas::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(ModelosMaquinas::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Proveedores::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(UsuarioPaginas::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Paginas::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Usuarios::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(RolPermisos::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Permisos::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Roles::Table).to_owned())
            .await?;
        Ok(())
    }
}

//! Seed data every installation needs: base roles, permissions and the
//! system pages the frontend navigates to.

use chrono::Utc;
use sea_orm::{ConnectionTrait, DbErr, Statement};
use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[derive(Iden)]
enum Roles {
    Table,
    Nombre,
    Descripcion,
    Activo,
    FechaCreacion,
}

#[derive(Iden)]
enum Permisos {
    Table,
    Nombre,
    Descripcion,
    Recurso,
    Accion,
    Activo,
}

#[derive(Iden)]
enum Paginas {
    Table,
    Nombre,
    Ruta,
    Titulo,
    Descripcion,
    Icono,
    Orden,
    Activa,
    SoloAdmin,
}

const ROLES: [(&str, &str); 2] = [
    ("admin", "Administrador del sistema con acceso completo"),
    ("user", "Usuario estándar del sistema"),
];

/// `(nombre, descripcion, recurso, accion)`
const PERMISSIONS: [(&str, &str, &str, &str); 15] = [
    ("repuestos_leer", "Ver repuestos", "repuestos", "leer"),
    ("repuestos_crear", "Crear repuestos", "repuestos", "crear"),
    ("repuestos_editar", "Editar repuestos", "repuestos", "editar"),
    ("repuestos_eliminar", "Eliminar repuestos", "repuestos", "eliminar"),
    ("maquinas_leer", "Ver máquinas", "maquinas", "leer"),
    ("maquinas_crear", "Crear máquinas", "maquinas", "crear"),
    ("maquinas_editar", "Editar máquinas", "maquinas", "editar"),
    ("ordenes_trabajo_leer", "Ver órdenes de trabajo", "ordenes_trabajo", "leer"),
    ("ordenes_trabajo_crear", "Crear órdenes de trabajo", "ordenes_trabajo", "crear"),
    ("ordenes_trabajo_editar", "Editar órdenes de trabajo", "ordenes_trabajo", "editar"),
    ("ordenes_compra_leer", "Ver órdenes de compra", "ordenes_compra", "leer"),
    ("ordenes_compra_crear", "Crear órdenes de compra", "ordenes_compra", "crear"),
    ("ordenes_compra_editar", "Editar órdenes de compra", "ordenes_compra", "editar"),
    ("admin_usuarios", "Administrar usuarios", "administracion", "admin"),
    ("admin_sistema", "Administrar sistema", "administracion", "admin"),
];

struct SeedPage {
    nombre: &'static str,
    ruta: &'static str,
    titulo: &'static str,
    descripcion: &'static str,
    icono: &'static str,
    solo_admin: bool,
}

const PAGES: [SeedPage; 13] = [
    SeedPage {
        nombre: "repuestos",
        ruta: "/repuestos",
        titulo: "Repuestos",
        descripcion: "Gestión de inventario de repuestos",
        icono: "Package",
        solo_admin: false,
    },
    SeedPage {
        nombre: "proveedores",
        ruta: "/proveedores",
        titulo: "Proveedores",
        descripcion: "Administrar proveedores y contactos",
        icono: "Users",
        solo_admin: false,
    },
    SeedPage {
        nombre: "ordenes_compra",
        ruta: "/ordenes-compra",
        titulo: "Órdenes de Compra",
        descripcion: "Gestión de pedidos de repuestos",
        icono: "ShoppingCart",
        solo_admin: false,
    },
    SeedPage {
        nombre: "maquinas",
        ruta: "/maquinas",
        titulo: "Máquinas",
        descripcion: "Gestión de máquinas y equipos",
        icono: "Cpu",
        solo_admin: false,
    },
    SeedPage {
        nombre: "modelos_maquinas",
        ruta: "/modelos-maquinas",
        titulo: "Modelos",
        descripcion: "Gestión de modelos de máquinas",
        icono: "Settings",
        solo_admin: false,
    },
    SeedPage {
        nombre: "plan_mantenimiento",
        ruta: "/plan-mantenimiento",
        titulo: "Plan de Mantenimiento",
        descripcion: "Planificación de mantenimientos preventivos",
        icono: "Calendar",
        solo_admin: false,
    },
    SeedPage {
        nombre: "ordenes_trabajo",
        ruta: "/ordenes-trabajo",
        titulo: "Generar OT",
        descripcion: "Gestión de órdenes de trabajo",
        icono: "Wrench",
        solo_admin: false,
    },
    SeedPage {
        nombre: "mis_ordenes_trabajo",
        ruta: "/mis-ordenes-trabajo",
        titulo: "OTs Asignadas",
        descripcion: "Órdenes de trabajo asignadas al usuario",
        icono: "ClipboardList",
        solo_admin: false,
    },
    SeedPage {
        nombre: "analytics_ia",
        ruta: "/analytics-ia",
        titulo: "Analytics IA",
        descripcion: "Análisis predictivo con inteligencia artificial",
        icono: "Brain",
        solo_admin: false,
    },
    SeedPage {
        nombre: "dashboard_metricas",
        ruta: "/dashboard-metricas",
        titulo: "Dashboard Métricas",
        descripcion: "Métricas y KPIs del sistema",
        icono: "BarChart3",
        solo_admin: false,
    },
    SeedPage {
        nombre: "historial",
        ruta: "/historial",
        titulo: "Historial de Consumo",
        descripcion: "Historial de consumo de repuestos",
        icono: "History",
        solo_admin: false,
    },
    SeedPage {
        nombre: "usuarios",
        ruta: "/admin/usuarios",
        titulo: "Usuarios",
        descripcion: "Administración de usuarios del sistema",
        icono: "Shield",
        solo_admin: true,
    },
    SeedPage {
        nombre: "admin",
        ruta: "/admin",
        titulo: "Administración",
        descripcion: "Panel de administración del sistema",
        icono: "Settings",
        solo_admin: true,
    },
];

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();
        let backend = db.get_database_backend();
        let now = Utc::now();

        for (nombre, descripcion) in ROLES {
            let stmt = Query::insert()
                .into_table(Roles::Table)
                .columns([
                    Roles::Nombre,
                    Roles::Descripcion,
                    Roles::Activo,
                    Roles::FechaCreacion,
                ])
                .values_panic([nombre.into(), descripcion.into(), true.into(), now.into()])
                .on_conflict(OnConflict::column(Roles::Nombre).do_nothing().to_owned())
                .to_owned();
            db.execute(backend.build(&stmt)).await?;
        }

        for (nombre, descripcion, recurso, accion) in PERMISSIONS {
            let stmt = Query::insert()
                .into_table(Permisos::Table)
                .columns([
                    Permisos::Nombre,
                    Permisos::Descripcion,
                    Permisos::Recurso,
                    Permisos::Accion,
                    Permisos::Activo,
                ])
                .values_panic([
                    nombre.into(),
                    descripcion.into(),
                    recurso.into(),
                    accion.into(),
                    true.into(),
                ])
                .on_conflict(OnConflict::column(Permisos::Nombre).do_nothing().to_owned())
                .to_owned();
            db.execute(backend.build(&stmt)).await?;
        }

        for (index, page) in PAGES.iter().enumerate() {
            let orden = <i32 as TryFrom<usize>>::try_from(index + 1)
                .map_err(|err| DbErr::Custom(err.to_string()))?;
            let stmt = Query::insert()
                .into_table(Paginas::Table)
                .columns([
                    Paginas::Nombre,
                    Paginas::Ruta,
                    Paginas::Titulo,
                    Paginas::Descripcion,
                    Paginas::Icono,
                    Paginas::Orden,
                    Paginas::Activa,
                    Paginas::SoloAdmin,
                ])
                .values_panic([
                    page.nombre.into(),
                    page.ruta.into(),
                    page.titulo.into(),
                    page.descripcion.into(),
                    page.icono.into(),
                    orden.into(),
                    true.into(),
                    page.solo_admin.into(),
                ])
                .on_conflict(OnConflict::column(Paginas::Nombre).do_nothing().to_owned())
                .to_owned();
            db.execute(backend.build(&stmt)).await?;
        }

        // The admin role holds every permission.
        db.execute(Statement::from_string(
            backend,
            "INSERT INTO rol_permisos (rol_id, permiso_id) \
             SELECT r.id, p.id FROM roles r CROSS JOIN permisos p \
             WHERE r.nombre = 'admin' AND NOT EXISTS ( \
                 SELECT 1 FROM rol_permisos rp WHERE rp.rol_id = r.id AND rp.permiso_id = p.id \
             );"
            .to_string(),
        ))
        .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();
        let backend = db.get_database_backend();

        db.execute(Statement::from_string(
            backend,
            "DELETE FROM rol_permisos WHERE rol_id IN (SELECT id FROM roles WHERE nombre = 'admin');"
                .to_string(),
        ))
        .await?;

        let pages = Query::delete()
            .from_table(Paginas::Table)
            .and_where(Expr::col(Paginas::Nombre).is_in(PAGES.iter().map(|page| page.nombre)))
            .to_owned();
        db.execute(backend.build(&pages)).await?;

        let permissions = Query::delete()
            .from_table(Permisos::Table)
            .and_where(
                Expr::col(Permisos::Nombre).is_in(PERMISSIONS.iter().map(|(nombre, ..)| *nombre)),
            )
            .to_owned();
        db.execute(backend.build(&permissions)).await?;

        let roles = Query::delete()
            .from_table(Roles::Table)
            .and_where(Expr::col(Roles::Nombre).is_in(ROLES.iter().map(|(nombre, _)| *nombre)))
            .to_owned();
        db.execute(backend.build(&roles)).await?;

        Ok(())
    }
}

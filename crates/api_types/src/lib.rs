//! JSON request and response bodies of the Mantia REST API.
//!
//! Field names follow the database column names, so they stay in Spanish.
//! Enumerated values (`estado`, `nivel_criticidad`) travel as plain strings
//! and are validated by the server.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

fn yes() -> bool {
    true
}

/// Offset pagination accepted by every list endpoint.
#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize)]
pub struct ListQuery {
    pub skip: Option<u64>,
    pub limit: Option<u64>,
}

/// Plain acknowledgement body.
#[derive(Debug, Serialize, Deserialize)]
pub struct Message {
    pub message: String,
}

impl Message {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

pub mod supplier {
    use super::*;

    #[derive(Debug, Serialize, Deserialize)]
    pub struct ProveedorNew {
        pub nombre: String,
        pub contacto: Option<String>,
        pub telefono: Option<String>,
        pub email: Option<String>,
    }

    #[derive(Debug, Default, Serialize, Deserialize)]
    pub struct ProveedorUpdate {
        pub nombre: Option<String>,
        pub contacto: Option<String>,
        pub telefono: Option<String>,
        pub email: Option<String>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct ProveedorView {
        pub id: i32,
        pub nombre: String,
        pub contacto: Option<String>,
        pub telefono: Option<String>,
        pub email: Option<String>,
    }
}

pub mod machine {
    use super::*;

    #[derive(Debug, Serialize, Deserialize)]
    pub struct ModeloMaquinaNew {
        pub fabricante: Option<String>,
        pub modelo: String,
        pub detalle: Option<String>,
    }

    #[derive(Debug, Default, Serialize, Deserialize)]
    pub struct ModeloMaquinaUpdate {
        pub fabricante: Option<String>,
        pub modelo: Option<String>,
        pub detalle: Option<String>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct ModeloMaquinaView {
        pub id: i32,
        pub fabricante: Option<String>,
        pub modelo: String,
        pub detalle: Option<String>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct MaquinaNew {
        pub modelo_id: Option<i32>,
        pub numero_serie: String,
        pub alias: Option<String>,
        pub ubicacion: Option<String>,
    }

    #[derive(Debug, Default, Serialize, Deserialize)]
    pub struct MaquinaUpdate {
        pub modelo_id: Option<i32>,
        pub numero_serie: Option<String>,
        pub alias: Option<String>,
        pub ubicacion: Option<String>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct MaquinaView {
        pub id: i32,
        pub modelo_id: Option<i32>,
        pub numero_serie: String,
        pub alias: Option<String>,
        pub ubicacion: Option<String>,
    }
}

pub mod storage {
    use super::*;

    #[derive(Debug, Default, Serialize, Deserialize)]
    pub struct AlmacenamientoQuery {
        pub skip: Option<u64>,
        pub limit: Option<u64>,
        /// Case-insensitive match on code, name, description or location.
        pub search: Option<String>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct AlmacenamientoNew {
        pub codigo: String,
        pub nombre: String,
        pub descripcion: Option<String>,
        pub ubicacion_fisica: Option<String>,
    }

    #[derive(Debug, Default, Serialize, Deserialize)]
    pub struct AlmacenamientoUpdate {
        pub codigo: Option<String>,
        pub nombre: Option<String>,
        pub descripcion: Option<String>,
        pub ubicacion_fisica: Option<String>,
        pub activo: Option<bool>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct AlmacenamientoView {
        pub id: i32,
        pub codigo: String,
        pub nombre: String,
        pub descripcion: Option<String>,
        pub ubicacion_fisica: Option<String>,
        pub activo: bool,
    }
}

pub mod part {
    use super::*;

    #[derive(Debug, Serialize, Deserialize)]
    pub struct RepuestoNew {
        pub codigo: String,
        pub nombre: String,
        pub detalle: Option<String>,
        pub ubicacion: Option<String>,
        pub almacenamiento_id: Option<i32>,
        #[serde(default)]
        pub cantidad: i32,
        pub cantidad_minima: Option<i32>,
        pub proveedor_id: Option<i32>,
        pub tipo: Option<String>,
        pub descripcion_aduana: Option<String>,
    }

    #[derive(Debug, Default, Serialize, Deserialize)]
    pub struct RepuestoUpdate {
        pub codigo: Option<String>,
        pub nombre: Option<String>,
        pub detalle: Option<String>,
        pub ubicacion: Option<String>,
        pub almacenamiento_id: Option<i32>,
        pub cantidad: Option<i32>,
        pub cantidad_minima: Option<i32>,
        pub proveedor_id: Option<i32>,
        pub tipo: Option<String>,
        pub descripcion_aduana: Option<String>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct RepuestoView {
        pub id: i32,
        pub codigo: String,
        pub nombre: String,
        pub detalle: Option<String>,
        pub ubicacion: Option<String>,
        pub almacenamiento_id: Option<i32>,
        pub cantidad: i32,
        pub cantidad_minima: Option<i32>,
        pub proveedor_id: Option<i32>,
        pub tipo: Option<String>,
        pub descripcion_aduana: Option<String>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct StockUpdate {
        pub cantidad: i32,
    }
}

pub mod usage {
    use super::*;

    #[derive(Debug, Serialize, Deserialize)]
    pub struct HistorialNew {
        pub repuesto_id: i32,
        pub maquina_id: i32,
        pub cantidad_usada: i32,
        /// Defaults to now.
        pub fecha: Option<DateTime<Utc>>,
        pub observaciones: Option<String>,
    }

    #[derive(Debug, Default, Serialize, Deserialize)]
    pub struct HistorialUpdate {
        pub repuesto_id: Option<i32>,
        pub maquina_id: Option<i32>,
        pub cantidad_usada: Option<i32>,
        pub fecha: Option<DateTime<Utc>>,
        pub observaciones: Option<String>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct HistorialView {
        pub id: i32,
        pub repuesto_id: i32,
        pub maquina_id: i32,
        pub cantidad_usada: i32,
        pub fecha: DateTime<Utc>,
        pub observaciones: Option<String>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct RangoFechas {
        pub fecha_inicio: DateTime<Utc>,
        pub fecha_fin: DateTime<Utc>,
        pub skip: Option<u64>,
        pub limit: Option<u64>,
    }

    #[derive(Debug, Default, Serialize, Deserialize)]
    pub struct ConsumoQuery {
        pub fecha_inicio: Option<DateTime<Utc>>,
        pub fecha_fin: Option<DateTime<Utc>>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct EstadisticasConsumo {
        pub repuesto_id: i32,
        pub total_usado: i64,
        pub numero_usos: u64,
        pub promedio_por_uso: f64,
    }
}

pub mod purchase_order {
    use super::*;

    #[derive(Debug, Default, Serialize, Deserialize)]
    pub struct OrdenCompraQuery {
        pub estado: Option<String>,
        pub skip: Option<u64>,
        pub limit: Option<u64>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct ItemOrdenNew {
        pub repuesto_id: Option<i32>,
        pub cantidad_pedida: i32,
        pub descripcion_aduana: Option<String>,
        pub precio_unitario: Option<f64>,
        #[serde(default)]
        pub es_item_manual: bool,
        pub nombre_manual: Option<String>,
        pub codigo_manual: Option<String>,
        pub detalle_manual: Option<String>,
        pub cantidad_minima_manual: Option<i32>,
    }

    #[derive(Debug, Default, Serialize, Deserialize)]
    pub struct ItemOrdenUpdate {
        pub repuesto_id: Option<i32>,
        pub cantidad_pedida: Option<i32>,
        pub cantidad_recibida: Option<i32>,
        pub descripcion_aduana: Option<String>,
        pub precio_unitario: Option<f64>,
        pub nombre_manual: Option<String>,
        pub codigo_manual: Option<String>,
        pub detalle_manual: Option<String>,
        pub cantidad_minima_manual: Option<i32>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct ItemOrdenView {
        pub id: i32,
        pub orden_id: i32,
        pub repuesto_id: Option<i32>,
        pub cantidad_pedida: i32,
        pub cantidad_recibida: i32,
        pub descripcion_aduana: Option<String>,
        pub precio_unitario: Option<f64>,
        pub es_item_manual: bool,
        pub nombre_manual: Option<String>,
        pub codigo_manual: Option<String>,
        pub detalle_manual: Option<String>,
        pub cantidad_minima_manual: Option<i32>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct OrdenCompraNew {
        pub proveedor_id: Option<i32>,
        pub numero_requisicion: Option<String>,
        pub legajo: Option<String>,
        pub observaciones: Option<String>,
        #[serde(default)]
        pub items: Vec<ItemOrdenNew>,
    }

    #[derive(Debug, Default, Serialize, Deserialize)]
    pub struct OrdenCompraUpdate {
        pub proveedor_id: Option<i32>,
        /// One of `borrador`, `cotizado`, `confirmado`, `completado`.
        pub estado: Option<String>,
        pub numero_requisicion: Option<String>,
        pub legajo: Option<String>,
        pub observaciones: Option<String>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct DocumentoView {
        pub id: i32,
        pub orden_id: i32,
        pub nombre_archivo: String,
        pub tipo_archivo: String,
        pub tamano_archivo: i64,
        pub usuario_subida_id: Option<i32>,
        pub fecha_subida: DateTime<Utc>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct OrdenCompraView {
        pub id: i32,
        pub proveedor_id: Option<i32>,
        pub estado: String,
        pub numero_requisicion: Option<String>,
        pub legajo: Option<String>,
        pub observaciones: Option<String>,
        pub usuario_creador_id: Option<i32>,
        pub fecha_creacion: DateTime<Utc>,
        pub fecha_actualizacion: DateTime<Utc>,
        pub items: Vec<ItemOrdenView>,
        pub documentos: Vec<DocumentoView>,
    }

    #[derive(Clone, Copy, Debug, Serialize, Deserialize)]
    pub struct ItemRecibido {
        pub item_id: i32,
        pub cantidad_recibida: i32,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct ConfirmarLlegada {
        pub items_recibidos: Vec<ItemRecibido>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct EstadisticasOrdenes {
        pub total: u64,
        pub borradores: u64,
        pub cotizados: u64,
        pub confirmados: u64,
        pub completados: u64,
    }
}

pub mod work_order {
    use super::*;

    #[derive(Debug, Default, Serialize, Deserialize)]
    pub struct OrdenTrabajoQuery {
        pub skip: Option<u64>,
        pub limit: Option<u64>,
        pub search: Option<String>,
        pub estado: Option<String>,
        pub nivel_criticidad: Option<String>,
        pub usuario_asignado_id: Option<i32>,
        pub maquina_id: Option<i32>,
        pub fecha_desde: Option<DateTime<Utc>>,
        pub fecha_hasta: Option<DateTime<Utc>>,
        /// `fecha_creacion` (default), `fecha_programada` or `nivel_criticidad`.
        pub sort_by: Option<String>,
        /// `asc` or `desc` (default).
        pub sort_order: Option<String>,
    }

    #[derive(Debug, Default, Serialize, Deserialize)]
    pub struct MisOrdenesQuery {
        pub estado: Option<String>,
        pub skip: Option<u64>,
        pub limit: Option<u64>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct OrdenTrabajoNew {
        pub titulo: String,
        pub descripcion: Option<String>,
        pub maquina_id: i32,
        pub usuario_asignado_id: i32,
        pub nivel_criticidad: String,
        pub fecha_programada: DateTime<Utc>,
        pub tiempo_estimado_horas: Option<f64>,
    }

    #[derive(Debug, Default, Serialize, Deserialize)]
    pub struct OrdenTrabajoUpdate {
        pub titulo: Option<String>,
        pub descripcion: Option<String>,
        pub maquina_id: Option<i32>,
        pub usuario_asignado_id: Option<i32>,
        pub nivel_criticidad: Option<String>,
        pub estado: Option<String>,
        pub fecha_programada: Option<DateTime<Utc>>,
        pub tiempo_estimado_horas: Option<f64>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct EstadoUpdate {
        pub estado: String,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct OrdenTrabajoView {
        pub id: i32,
        pub titulo: String,
        pub descripcion: Option<String>,
        pub maquina_id: i32,
        pub usuario_asignado_id: i32,
        pub usuario_creador_id: i32,
        pub nivel_criticidad: String,
        pub estado: String,
        pub fecha_programada: DateTime<Utc>,
        pub tiempo_estimado_horas: Option<f64>,
        pub fecha_creacion: DateTime<Utc>,
        pub fecha_inicio: Option<DateTime<Utc>>,
        pub fecha_finalizacion: Option<DateTime<Utc>>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct EstadisticasOrdenesTrabajo {
        pub total: u64,
        pub pendiente: u64,
        pub en_proceso: u64,
        pub completada: u64,
        pub cancelada: u64,
        pub baja: u64,
        pub media: u64,
        pub alta: u64,
        pub critica: u64,
        pub vencidas: u64,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct ComentarioNew {
        pub comentario: String,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct ComentarioView {
        pub id: i32,
        pub orden_trabajo_id: i32,
        pub usuario_id: i32,
        pub comentario: String,
        pub fecha_creacion: DateTime<Utc>,
    }

    /// JSON form of an upload, for clients that do not send multipart.
    /// Purchase-order documents may omit `tipo_mime`.
    #[derive(Debug, Serialize, Deserialize)]
    pub struct ArchivoUpload {
        pub nombre_archivo: String,
        #[serde(default)]
        pub tipo_mime: Option<String>,
        pub contenido_base64: String,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct ArchivoView {
        pub id: i32,
        pub orden_trabajo_id: i32,
        pub comentario_id: Option<i32>,
        pub usuario_id: i32,
        pub nombre_archivo: String,
        pub tipo_mime: Option<String>,
        pub tamano_bytes: i64,
        pub fecha_subida: DateTime<Utc>,
    }

    /// A downloaded attachment.
    #[derive(Debug, Serialize, Deserialize)]
    pub struct ArchivoContenido {
        pub nombre_archivo: String,
        pub tipo_mime: Option<String>,
        pub contenido_base64: String,
    }
}

pub mod admin {
    use super::*;

    #[derive(Debug, Serialize, Deserialize)]
    pub struct PermisoNew {
        pub nombre: String,
        pub descripcion: Option<String>,
        pub recurso: String,
        pub accion: String,
        #[serde(default = "yes")]
        pub activo: bool,
    }

    #[derive(Debug, Default, Serialize, Deserialize)]
    pub struct PermisoUpdate {
        pub nombre: Option<String>,
        pub descripcion: Option<String>,
        pub recurso: Option<String>,
        pub accion: Option<String>,
        pub activo: Option<bool>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct PermisoView {
        pub id: i32,
        pub nombre: String,
        pub descripcion: Option<String>,
        pub recurso: String,
        pub accion: String,
        pub activo: bool,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct RolNew {
        pub nombre: String,
        pub descripcion: Option<String>,
        #[serde(default = "yes")]
        pub activo: bool,
        #[serde(default)]
        pub permiso_ids: Vec<i32>,
    }

    #[derive(Debug, Default, Serialize, Deserialize)]
    pub struct RolUpdate {
        pub nombre: Option<String>,
        pub descripcion: Option<String>,
        pub activo: Option<bool>,
        /// Replaces the whole permission set when present.
        pub permiso_ids: Option<Vec<i32>>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct RolView {
        pub id: i32,
        pub nombre: String,
        pub descripcion: Option<String>,
        pub activo: bool,
        pub fecha_creacion: DateTime<Utc>,
        pub permisos: Vec<PermisoView>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct PaginaNew {
        pub nombre: String,
        pub ruta: String,
        pub titulo: String,
        pub descripcion: Option<String>,
        pub icono: Option<String>,
        #[serde(default)]
        pub orden: i32,
        #[serde(default = "yes")]
        pub activa: bool,
        #[serde(default)]
        pub solo_admin: bool,
    }

    #[derive(Debug, Default, Serialize, Deserialize)]
    pub struct PaginaUpdate {
        pub nombre: Option<String>,
        pub ruta: Option<String>,
        pub titulo: Option<String>,
        pub descripcion: Option<String>,
        pub icono: Option<String>,
        pub orden: Option<i32>,
        pub activa: Option<bool>,
        pub solo_admin: Option<bool>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct PaginaView {
        pub id: i32,
        pub nombre: String,
        pub ruta: String,
        pub titulo: String,
        pub descripcion: Option<String>,
        pub icono: Option<String>,
        pub orden: i32,
        pub activa: bool,
        pub solo_admin: bool,
    }
}

pub mod user {
    use super::*;

    #[derive(Debug, Serialize, Deserialize)]
    pub struct UsuarioNew {
        pub username: String,
        pub email: String,
        pub password: String,
        pub nombre_completo: Option<String>,
        #[serde(default = "yes")]
        pub activo: bool,
        #[serde(default)]
        pub es_admin: bool,
        pub rol_id: Option<i32>,
        #[serde(default)]
        pub debe_cambiar_password: bool,
    }

    #[derive(Debug, Default, Serialize, Deserialize)]
    pub struct UsuarioUpdate {
        pub username: Option<String>,
        pub email: Option<String>,
        pub nombre_completo: Option<String>,
        pub activo: Option<bool>,
        pub es_admin: Option<bool>,
        pub rol_id: Option<i32>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct UsuarioView {
        pub id: i32,
        pub username: String,
        pub email: String,
        pub nombre_completo: Option<String>,
        pub activo: bool,
        pub es_admin: bool,
        pub rol_id: Option<i32>,
        pub fecha_creacion: DateTime<Utc>,
        pub ultima_conexion: Option<DateTime<Utc>>,
        pub debe_cambiar_password: bool,
        pub intentos_fallidos: i32,
        pub bloqueado_hasta: Option<DateTime<Utc>>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct AsignarPaginas {
        pub pagina_ids: Vec<i32>,
    }
}

pub mod auth {
    use super::*;
    use crate::user::UsuarioView;

    #[derive(Debug, Serialize, Deserialize)]
    pub struct LoginRequest {
        pub username: String,
        pub password: String,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct TokenResponse {
        pub access_token: String,
        pub token_type: String,
        /// Lifetime in seconds.
        pub expires_in: i64,
        pub user: UsuarioView,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct ChangePassword {
        pub password_actual: String,
        pub password_nueva: String,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct ResetPassword {
        pub user_id: i32,
        pub password_nueva: String,
        #[serde(default = "yes")]
        pub forzar_cambio: bool,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct TokenCheck {
        pub valid: bool,
        pub username: String,
        pub expires_at: DateTime<Utc>,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_user_defaults_to_active_non_admin() {
        let user: user::UsuarioNew = serde_json::from_str(
            r#"{"username":"ana","email":"ana@example.com","password":"x"}"#,
        )
        .unwrap();
        assert!(user.activo);
        assert!(!user.es_admin);
        assert!(!user.debe_cambiar_password);
    }

    #[test]
    fn order_items_are_optional_on_create() {
        let order: purchase_order::OrdenCompraNew =
            serde_json::from_str(r#"{"proveedor_id":3}"#).unwrap();
        assert!(order.items.is_empty());
        assert_eq!(order.proveedor_id, Some(3));
    }

    #[test]
    fn reset_password_forces_a_change_unless_told_otherwise() {
        let reset: auth::ResetPassword =
            serde_json::from_str(r#"{"user_id":1,"password_nueva":"nueva"}"#).unwrap();
        assert!(reset.forzar_cambio);
    }

    #[test]
    fn received_items_use_column_names() {
        let body = serde_json::to_value(purchase_order::ItemRecibido {
            item_id: 4,
            cantidad_recibida: 2,
        })
        .unwrap();
        assert_eq!(body["cantidad_recibida"], 2);
    }

    #[test]
    fn arrival_body_lists_items_recibidos() {
        let body: purchase_order::ConfirmarLlegada = serde_json::from_str(
            r#"{"items_recibidos":[{"item_id":4,"cantidad_recibida":2}]}"#,
        )
        .unwrap();
        assert_eq!(body.items_recibidos.len(), 1);
        assert_eq!(body.items_recibidos[0].item_id, 4);
    }

    #[test]
    fn order_stats_use_plural_keys() {
        let body = serde_json::to_value(purchase_order::EstadisticasOrdenes {
            total: 4,
            borradores: 1,
            cotizados: 1,
            confirmados: 1,
            completados: 1,
        })
        .unwrap();
        for key in ["borradores", "cotizados", "confirmados", "completados"] {
            assert_eq!(body[key], 1, "{key}");
        }
    }
}

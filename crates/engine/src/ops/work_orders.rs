use chrono::{DateTime, NaiveTime, Utc};
use sea_orm::{
    ActiveValue, Condition, DatabaseTransaction, Order, PaginatorTrait, QueryFilter, QueryOrder,
    TransactionTrait, prelude::*,
    sea_query::{Expr, Func, SimpleExpr},
};

use crate::{
    Criticality, EngineError, ResultEngine, WorkOrder, WorkOrderComment, WorkOrderFile,
    WorkOrderFileNew, WorkOrderFilter, WorkOrderNew, WorkOrderPatch, WorkOrderSort,
    WorkOrderState, WorkOrderStats,
    util::{Pagination, normalize_optional, normalize_required, patch_optional, patch_required},
    work_order_comments, work_order_files, work_orders,
};

use super::{Engine, paginate, with_tx};

/// SQL rank of `nivel_criticidad`, lowest first.
fn criticality_rank() -> SimpleExpr {
    let arms: String = Criticality::ALL
        .iter()
        .map(|level| format!(" WHEN '{}' THEN {}", level.as_str(), level.rank()))
        .collect();
    Expr::cust(format!("CASE nivel_criticidad{arms} ELSE 0 END"))
}

fn start_of_day(now: DateTime<Utc>) -> DateTime<Utc> {
    now.date_naive().and_time(NaiveTime::MIN).and_utc()
}

fn ensure_hours(hours: Option<f64>) -> ResultEngine<()> {
    match hours {
        Some(hours) if !hours.is_finite() || hours < 0.0 => Err(EngineError::Invalid(
            "tiempo_estimado_horas must be >= 0".to_string(),
        )),
        _ => Ok(()),
    }
}

fn open_states() -> [&'static str; 2] {
    [
        WorkOrderState::Pendiente.as_str(),
        WorkOrderState::EnProceso.as_str(),
    ]
}

impl Engine {
    /// List work orders matching `filter`.
    pub async fn list_work_orders(
        &self,
        filter: WorkOrderFilter,
        pagination: Pagination,
    ) -> ResultEngine<Vec<WorkOrder>> {
        let search = normalize_optional(filter.search.as_deref())
            .map(|term| format!("%{}%", term.to_lowercase()));
        with_tx!(self, |db_tx| {
            let mut query = work_orders::Entity::find();
            if let Some(pattern) = search.as_deref() {
                query = query.filter(
                    Condition::any()
                        .add(
                            Expr::expr(Func::lower(Expr::col(work_orders::Column::Title)))
                                .like(pattern),
                        )
                        .add(
                            Expr::expr(Func::lower(Expr::col(work_orders::Column::Description)))
                                .like(pattern),
                        ),
                );
            }
            if let Some(state) = filter.state {
                query = query.filter(work_orders::Column::State.eq(state.as_str()));
            }
            if let Some(criticality) = filter.criticality {
                query = query.filter(work_orders::Column::Criticality.eq(criticality.as_str()));
            }
            if let Some(assignee_id) = filter.assignee_id {
                query = query.filter(work_orders::Column::AssigneeId.eq(assignee_id));
            }
            if let Some(machine_id) = filter.machine_id {
                query = query.filter(work_orders::Column::MachineId.eq(machine_id));
            }
            if let Some(from) = filter.scheduled_from {
                query = query.filter(work_orders::Column::ScheduledFor.gte(from));
            }
            if let Some(to) = filter.scheduled_to {
                query = query.filter(work_orders::Column::ScheduledFor.lte(to));
            }
            let order = if filter.descending {
                Order::Desc
            } else {
                Order::Asc
            };
            query = match filter.sort {
                WorkOrderSort::CreatedAt => {
                    query.order_by(work_orders::Column::CreatedAt, order.clone())
                }
                WorkOrderSort::ScheduledFor => {
                    query.order_by(work_orders::Column::ScheduledFor, order.clone())
                }
                WorkOrderSort::Criticality => query.order_by(criticality_rank(), order.clone()),
            };
            let models = paginate(query.order_by(work_orders::Column::Id, order), pagination)
                .all(&db_tx)
                .await?;
            models
                .into_iter()
                .map(WorkOrder::try_from)
                .collect::<ResultEngine<Vec<_>>>()
        })
    }

    /// Work orders assigned to `user_id`, latest scheduled first.
    pub async fn assigned_work_orders(
        &self,
        user_id: i32,
        state: Option<WorkOrderState>,
        pagination: Pagination,
    ) -> ResultEngine<Vec<WorkOrder>> {
        with_tx!(self, |db_tx| {
            let mut query = work_orders::Entity::find()
                .filter(work_orders::Column::AssigneeId.eq(user_id))
                .order_by_desc(work_orders::Column::ScheduledFor)
                .order_by_desc(work_orders::Column::Id);
            if let Some(state) = state {
                query = query.filter(work_orders::Column::State.eq(state.as_str()));
            }
            let models = paginate(query, pagination).all(&db_tx).await?;
            models
                .into_iter()
                .map(WorkOrder::try_from)
                .collect::<ResultEngine<Vec<_>>>()
        })
    }

    pub async fn work_order(&self, work_order_id: i32) -> ResultEngine<WorkOrder> {
        with_tx!(self, |db_tx| {
            let model = self.require_work_order(&db_tx, work_order_id).await?;
            WorkOrder::try_from(model)
        })
    }

    /// Counts per state and criticality, plus the overdue ones: scheduled
    /// before today and still open.
    pub async fn work_order_stats(&self) -> ResultEngine<WorkOrderStats> {
        let today = start_of_day(Utc::now());
        with_tx!(self, |db_tx| {
            let mut stats = WorkOrderStats::default();
            for state in WorkOrderState::ALL {
                let count = work_orders::Entity::find()
                    .filter(work_orders::Column::State.eq(state.as_str()))
                    .count(&db_tx)
                    .await?;
                match state {
                    WorkOrderState::Pendiente => stats.pendiente = count,
                    WorkOrderState::EnProceso => stats.en_proceso = count,
                    WorkOrderState::Completada => stats.completada = count,
                    WorkOrderState::Cancelada => stats.cancelada = count,
                }
            }
            for level in Criticality::ALL {
                let count = work_orders::Entity::find()
                    .filter(work_orders::Column::Criticality.eq(level.as_str()))
                    .count(&db_tx)
                    .await?;
                match level {
                    Criticality::Baja => stats.baja = count,
                    Criticality::Media => stats.media = count,
                    Criticality::Alta => stats.alta = count,
                    Criticality::Critica => stats.critica = count,
                }
            }
            stats.total = work_orders::Entity::find().count(&db_tx).await?;
            stats.overdue = work_orders::Entity::find()
                .filter(work_orders::Column::ScheduledFor.lt(today))
                .filter(work_orders::Column::State.is_in(open_states()))
                .count(&db_tx)
                .await?;
            Ok(stats)
        })
    }

    pub async fn new_work_order(
        &self,
        input: WorkOrderNew,
        created_by: i32,
    ) -> ResultEngine<WorkOrder> {
        let title = normalize_required(&input.title, "titulo")?;
        ensure_hours(input.estimated_hours)?;
        with_tx!(self, |db_tx| {
            self.require_machine(&db_tx, input.machine_id).await?;
            self.require_user(&db_tx, input.assignee_id).await?;
            let model = work_orders::ActiveModel {
                id: ActiveValue::NotSet,
                title: ActiveValue::Set(title),
                description: ActiveValue::Set(normalize_optional(input.description.as_deref())),
                machine_id: ActiveValue::Set(input.machine_id),
                assignee_id: ActiveValue::Set(input.assignee_id),
                created_by: ActiveValue::Set(created_by),
                criticality: ActiveValue::Set(input.criticality.as_str().to_string()),
                state: ActiveValue::Set(WorkOrderState::Pendiente.as_str().to_string()),
                scheduled_for: ActiveValue::Set(input.scheduled_for),
                estimated_hours: ActiveValue::Set(input.estimated_hours),
                created_at: ActiveValue::Set(Utc::now()),
                started_at: ActiveValue::Set(None),
                finished_at: ActiveValue::Set(None),
            }
            .insert(&db_tx)
            .await?;
            tracing::info!(work_order_id = model.id, "work order created");
            WorkOrder::try_from(model)
        })
    }

    /// Update a work order. The first move to `en_proceso` stamps the start
    /// time and the first move to `completada` stamps the finish time.
    pub async fn update_work_order(
        &self,
        work_order_id: i32,
        patch: WorkOrderPatch,
    ) -> ResultEngine<WorkOrder> {
        ensure_hours(patch.estimated_hours)?;
        with_tx!(self, |db_tx| {
            let current = self.require_work_order(&db_tx, work_order_id).await?;
            if let Some(machine_id) = patch.machine_id {
                self.require_machine(&db_tx, machine_id).await?;
            }
            if let Some(assignee_id) = patch.assignee_id {
                self.require_user(&db_tx, assignee_id).await?;
            }
            let mut title = current.title.clone();
            patch_required(&mut title, patch.title.as_deref(), "titulo")?;
            let mut description = current.description.clone();
            patch_optional(&mut description, patch.description.as_deref());

            let now = Utc::now();
            let mut started_at = current.started_at;
            let mut finished_at = current.finished_at;
            let state = match patch.state {
                Some(state) => {
                    match state {
                        WorkOrderState::EnProceso if started_at.is_none() => {
                            started_at = Some(now);
                        }
                        WorkOrderState::Completada if finished_at.is_none() => {
                            finished_at = Some(now);
                        }
                        _ => {}
                    }
                    if current.state != state.as_str() {
                        tracing::info!(
                            work_order_id,
                            from = %current.state,
                            to = state.as_str(),
                            "work order state changed"
                        );
                    }
                    state.as_str().to_string()
                }
                None => current.state.clone(),
            };
            let criticality = patch
                .criticality
                .map(|level| level.as_str().to_string())
                .unwrap_or_else(|| current.criticality.clone());
            let machine_id = patch.machine_id.unwrap_or(current.machine_id);
            let assignee_id = patch.assignee_id.unwrap_or(current.assignee_id);
            let scheduled_for = patch.scheduled_for.unwrap_or(current.scheduled_for);
            let estimated_hours = patch.estimated_hours.or(current.estimated_hours);

            let mut active: work_orders::ActiveModel = current.into();
            active.title = ActiveValue::Set(title);
            active.description = ActiveValue::Set(description);
            active.machine_id = ActiveValue::Set(machine_id);
            active.assignee_id = ActiveValue::Set(assignee_id);
            active.criticality = ActiveValue::Set(criticality);
            active.state = ActiveValue::Set(state);
            active.scheduled_for = ActiveValue::Set(scheduled_for);
            active.estimated_hours = ActiveValue::Set(estimated_hours);
            active.started_at = ActiveValue::Set(started_at);
            active.finished_at = ActiveValue::Set(finished_at);
            let model = active.update(&db_tx).await?;
            WorkOrder::try_from(model)
        })
    }

    pub async fn set_work_order_state(
        &self,
        work_order_id: i32,
        state: WorkOrderState,
    ) -> ResultEngine<WorkOrder> {
        self.update_work_order(
            work_order_id,
            WorkOrderPatch {
                state: Some(state),
                ..Default::default()
            },
        )
        .await
    }

    /// Delete a work order with its comments and attachments. The removed
    /// attachments are returned so their stored files can be cleaned up.
    pub async fn delete_work_order(&self, work_order_id: i32) -> ResultEngine<Vec<WorkOrderFile>> {
        with_tx!(self, |db_tx| {
            self.require_work_order(&db_tx, work_order_id).await?;
            let files = work_order_files::Entity::find()
                .filter(work_order_files::Column::WorkOrderId.eq(work_order_id))
                .all(&db_tx)
                .await?;
            work_order_files::Entity::delete_many()
                .filter(work_order_files::Column::WorkOrderId.eq(work_order_id))
                .exec(&db_tx)
                .await?;
            work_order_comments::Entity::delete_many()
                .filter(work_order_comments::Column::WorkOrderId.eq(work_order_id))
                .exec(&db_tx)
                .await?;
            work_orders::Entity::delete_by_id(work_order_id)
                .exec(&db_tx)
                .await?;
            tracing::info!(work_order_id, "work order deleted");
            Ok(files.into_iter().map(WorkOrderFile::from).collect())
        })
    }

    // ── comments ───────────────────────────────────────────────────────────

    pub async fn add_work_order_comment(
        &self,
        work_order_id: i32,
        author_id: i32,
        body: &str,
    ) -> ResultEngine<WorkOrderComment> {
        let body = normalize_required(body, "comentario")?;
        with_tx!(self, |db_tx| {
            self.require_work_order(&db_tx, work_order_id).await?;
            let model = work_order_comments::ActiveModel {
                id: ActiveValue::NotSet,
                work_order_id: ActiveValue::Set(work_order_id),
                author_id: ActiveValue::Set(author_id),
                body: ActiveValue::Set(body),
                created_at: ActiveValue::Set(Utc::now()),
            }
            .insert(&db_tx)
            .await?;
            Ok(WorkOrderComment::from(model))
        })
    }

    /// Comments of a work order, newest first.
    pub async fn work_order_comments(
        &self,
        work_order_id: i32,
        pagination: Pagination,
    ) -> ResultEngine<Vec<WorkOrderComment>> {
        with_tx!(self, |db_tx| {
            self.require_work_order(&db_tx, work_order_id).await?;
            let models = paginate(
                work_order_comments::Entity::find()
                    .filter(work_order_comments::Column::WorkOrderId.eq(work_order_id))
                    .order_by_desc(work_order_comments::Column::CreatedAt)
                    .order_by_desc(work_order_comments::Column::Id),
                pagination,
            )
            .all(&db_tx)
            .await?;
            Ok(models.into_iter().map(WorkOrderComment::from).collect())
        })
    }

    pub async fn work_order_comment(&self, comment_id: i32) -> ResultEngine<WorkOrderComment> {
        with_tx!(self, |db_tx| {
            let model = self.require_comment(&db_tx, comment_id).await?;
            Ok(WorkOrderComment::from(model))
        })
    }

    // ── attachments ────────────────────────────────────────────────────────

    pub async fn add_work_order_file(
        &self,
        work_order_id: i32,
        uploaded_by: i32,
        file: WorkOrderFileNew,
    ) -> ResultEngine<WorkOrderFile> {
        with_tx!(self, |db_tx| {
            self.require_work_order(&db_tx, work_order_id).await?;
            self.insert_work_order_file(&db_tx, work_order_id, None, uploaded_by, file)
                .await
        })
    }

    /// Attach a file to a comment. Only the comment author or an admin may.
    pub async fn add_comment_file(
        &self,
        comment_id: i32,
        uploaded_by: i32,
        is_admin: bool,
        file: WorkOrderFileNew,
    ) -> ResultEngine<WorkOrderFile> {
        with_tx!(self, |db_tx| {
            let comment = self.require_comment(&db_tx, comment_id).await?;
            if comment.author_id != uploaded_by && !is_admin {
                return Err(EngineError::Forbidden(
                    "only the comment author can attach files to it".to_string(),
                ));
            }
            self.insert_work_order_file(
                &db_tx,
                comment.work_order_id,
                Some(comment_id),
                uploaded_by,
                file,
            )
            .await
        })
    }

    /// Files attached directly to the work order (not to its comments).
    pub async fn work_order_files(&self, work_order_id: i32) -> ResultEngine<Vec<WorkOrderFile>> {
        with_tx!(self, |db_tx| {
            self.require_work_order(&db_tx, work_order_id).await?;
            let models = work_order_files::Entity::find()
                .filter(work_order_files::Column::WorkOrderId.eq(work_order_id))
                .filter(work_order_files::Column::CommentId.is_null())
                .order_by_desc(work_order_files::Column::UploadedAt)
                .order_by_desc(work_order_files::Column::Id)
                .all(&db_tx)
                .await?;
            Ok(models.into_iter().map(WorkOrderFile::from).collect())
        })
    }

    pub async fn comment_files(&self, comment_id: i32) -> ResultEngine<Vec<WorkOrderFile>> {
        with_tx!(self, |db_tx| {
            self.require_comment(&db_tx, comment_id).await?;
            let models = work_order_files::Entity::find()
                .filter(work_order_files::Column::CommentId.eq(comment_id))
                .order_by_asc(work_order_files::Column::Id)
                .all(&db_tx)
                .await?;
            Ok(models.into_iter().map(WorkOrderFile::from).collect())
        })
    }

    pub async fn work_order_file(&self, file_id: i32) -> ResultEngine<WorkOrderFile> {
        with_tx!(self, |db_tx| {
            let model = self.require_work_order_file(&db_tx, file_id).await?;
            Ok(WorkOrderFile::from(model))
        })
    }

    /// Delete an attachment row and return it. Only the uploader or an admin may.
    pub async fn delete_work_order_file(
        &self,
        file_id: i32,
        user_id: i32,
        is_admin: bool,
    ) -> ResultEngine<WorkOrderFile> {
        with_tx!(self, |db_tx| {
            let model = self.require_work_order_file(&db_tx, file_id).await?;
            if model.uploaded_by != user_id && !is_admin {
                return Err(EngineError::Forbidden(
                    "only the uploader can delete this file".to_string(),
                ));
            }
            work_order_files::Entity::delete_by_id(file_id)
                .exec(&db_tx)
                .await?;
            tracing::info!(file_id, "work order file deleted");
            Ok(WorkOrderFile::from(model))
        })
    }

    async fn insert_work_order_file(
        &self,
        db_tx: &DatabaseTransaction,
        work_order_id: i32,
        comment_id: Option<i32>,
        uploaded_by: i32,
        file: WorkOrderFileNew,
    ) -> ResultEngine<WorkOrderFile> {
        let file_name = normalize_required(&file.file_name, "nombre_archivo")?;
        let model = work_order_files::ActiveModel {
            id: ActiveValue::NotSet,
            work_order_id: ActiveValue::Set(work_order_id),
            comment_id: ActiveValue::Set(comment_id),
            uploaded_by: ActiveValue::Set(uploaded_by),
            file_name: ActiveValue::Set(file_name),
            stored_name: ActiveValue::Set(file.stored_name),
            stored_path: ActiveValue::Set(file.stored_path),
            mime_type: ActiveValue::Set(file.mime_type),
            size_bytes: ActiveValue::Set(file.size_bytes),
            uploaded_at: ActiveValue::Set(Utc::now()),
        }
        .insert(db_tx)
        .await?;
        tracing::info!(
            work_order_id,
            file_id = model.id,
            size = model.size_bytes,
            "work order file added"
        );
        Ok(WorkOrderFile::from(model))
    }
}

//! # Reservation Repository

use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseBackend, EntityTrait,
    IntoActiveModel, ModelTrait, PaginatorTrait, QueryFilter, QueryOrder, Set, Statement,
};
use sea_orm::prelude::DateTimeWithTimeZone;

use super::now;
use crate::error::RepositoryError;
use crate::models::reservation::{self, Entity as Reservation, ReservationStatus};
use crate::tenancy::TenantId;

/// Who the reservation is for: a signed-in user or a guest with contact data.
#[derive(Debug, Clone)]
pub enum Booker {
    User(i64),
    Guest {
        name: String,
        email: String,
        phone: Option<String>,
    },
}

#[derive(Debug, Clone)]
pub struct NewReservation {
    pub booker: Booker,
    pub table_number: i32,
    pub start_time: DateTimeWithTimeZone,
    pub end_time: DateTimeWithTimeZone,
    pub number_of_guests: i32,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct ReservationChanges {
    pub status: Option<ReservationStatus>,
    pub notes: Option<String>,
}

pub struct ReservationRepository<'a, C> {
    db: &'a C,
    tenant: TenantId,
}

impl<'a, C: ConnectionTrait> ReservationRepository<'a, C> {
    pub fn new(db: &'a C, tenant: TenantId) -> Self {
        Self { db, tenant }
    }

    fn scoped(&self) -> sea_orm::Select<Reservation> {
        Reservation::find().filter(reservation::Column::RestaurantId.eq(self.tenant.get()))
    }

    /// Reservations ordered by start time; `user_id` narrows to one booker.
    pub async fn list(&self, user_id: Option<i64>) -> Result<Vec<reservation::Model>, RepositoryError> {
        let mut query = self.scoped();
        if let Some(user_id) = user_id {
            query = query.filter(reservation::Column::UserId.eq(user_id));
        }
        Ok(query
            .order_by_asc(reservation::Column::StartTime)
            .order_by_asc(reservation::Column::Id)
            .all(self.db)
            .await?)
    }

    pub async fn find(&self, id: i64) -> Result<Option<reservation::Model>, RepositoryError> {
        Ok(self
            .scoped()
            .filter(reservation::Column::Id.eq(id))
            .one(self.db)
            .await?)
    }

    pub async fn get(&self, id: i64) -> Result<reservation::Model, RepositoryError> {
        self.find(id)
            .await?
            .ok_or(RepositoryError::NotFound("reservation"))
    }

    /// Whether a non-cancelled reservation on `table_number` overlaps the
    /// half-open interval `[start, end)`, ignoring reservation `except`.
    pub async fn table_is_booked(
        &self,
        table_number: i32,
        start: DateTimeWithTimeZone,
        end: DateTimeWithTimeZone,
        except: Option<i64>,
    ) -> Result<bool, RepositoryError> {
        let mut query = self
            .scoped()
            .filter(reservation::Column::TableNumber.eq(table_number))
            .filter(reservation::Column::Status.ne(ReservationStatus::Cancelled.as_str()))
            .filter(reservation::Column::StartTime.lt(end))
            .filter(reservation::Column::EndTime.gt(start));
        if let Some(id) = except {
            query = query.filter(reservation::Column::Id.ne(id));
        }
        Ok(query.count(self.db).await? > 0)
    }

    /// Serializes bookings of one table until the surrounding transaction
    /// ends, so the overlap check and the write cannot interleave with a
    /// concurrent booking. No-op outside Postgres.
    async fn lock_table(&self, table_number: i32) -> Result<(), RepositoryError> {
        if self.db.get_database_backend() != DatabaseBackend::Postgres {
            return Ok(());
        }
        let restaurant_id = i32::try_from(self.tenant.get())
            .map_err(|_| RepositoryError::validation_error("restaurant id out of range"))?;
        self.db
            .execute(Statement::from_sql_and_values(
                DatabaseBackend::Postgres,
                "SELECT pg_advisory_xact_lock($1, $2)",
                [restaurant_id.into(), table_number.into()],
            ))
            .await?;
        Ok(())
    }

    /// Validates the booking window and table availability, then inserts a
    /// `pending` reservation.
    pub async fn create(&self, new: NewReservation) -> Result<reservation::Model, RepositoryError> {
        if new.end_time <= new.start_time {
            return Err(RepositoryError::validation_error(
                "end time must be after start time",
            ));
        }
        if new.start_time < now() {
            return Err(RepositoryError::validation_error(
                "reservation cannot be in the past",
            ));
        }
        if new.number_of_guests < 1 {
            return Err(RepositoryError::validation_error(
                "number of guests must be at least 1",
            ));
        }
        self.lock_table(new.table_number).await?;
        if self
            .table_is_booked(new.table_number, new.start_time, new.end_time, None)
            .await?
        {
            return Err(RepositoryError::conflict(
                "table is not available at the requested time",
            ));
        }

        let (user_id, guest_name, guest_email, guest_phone) = match new.booker {
            Booker::User(id) => (Some(id), None, None, None),
            Booker::Guest { name, email, phone } => (None, Some(name), Some(email), phone),
        };

        let timestamp = now();
        let model = reservation::ActiveModel {
            restaurant_id: Set(self.tenant.get()),
            user_id: Set(user_id),
            guest_name: Set(guest_name),
            guest_email: Set(guest_email),
            guest_phone: Set(guest_phone),
            table_number: Set(new.table_number),
            start_time: Set(new.start_time),
            end_time: Set(new.end_time),
            number_of_guests: Set(new.number_of_guests),
            status: Set(ReservationStatus::Pending.as_str().to_string()),
            notes: Set(new.notes),
            created_at: Set(timestamp),
            updated_at: Set(timestamp),
            ..Default::default()
        };
        Ok(model.insert(self.db).await?)
    }

    /// Applies status and notes changes. Moving a cancelled reservation back
    /// to any other status re-checks the table, since its slot may have been
    /// booked in the meantime.
    pub async fn update(
        &self,
        id: i64,
        changes: ReservationChanges,
    ) -> Result<reservation::Model, RepositoryError> {
        let existing = self.get(id).await?;
        let reinstated = existing.status == ReservationStatus::Cancelled.as_str()
            && changes
                .status
                .is_some_and(|status| status != ReservationStatus::Cancelled);
        if reinstated {
            self.lock_table(existing.table_number).await?;
            if self
                .table_is_booked(
                    existing.table_number,
                    existing.start_time,
                    existing.end_time,
                    Some(existing.id),
                )
                .await?
            {
                return Err(RepositoryError::conflict(
                    "table is no longer available at the reserved time",
                ));
            }
        }

        let mut active = existing.into_active_model();
        if let Some(status) = changes.status {
            active.status = Set(status.as_str().to_string());
        }
        if let Some(notes) = changes.notes {
            active.notes = Set(Some(notes));
        }
        active.updated_at = Set(now());
        Ok(active.update(self.db).await?)
    }

    pub async fn delete(&self, id: i64) -> Result<(), RepositoryError> {
        self.get(id).await?.delete(self.db).await?;
        Ok(())
    }
}

//! Reporting queries across the participant funnel: pre-registration,
//! registration, RSVP and check-in.

use std::sync::Arc;

use hackpsu_core::acl::{AclOperation, AclPerm, AclRegistry};
use hackpsu_core::roles::AuthLevel;

use crate::mapper::{with_page, GenericDataMapper};
use crate::mappers::hackathon_mapper::{self, HackathonMapper};
use crate::mappers::pre_registration_mapper::{self, PreRegistrationMapper};
use crate::mappers::registration_mapper::{self, RegistrationMapper};
use crate::mappers::rsvp_mapper::{self, RsvpMapper};
use crate::mappers::scanner_mapper::{self, ScannerMapper};
use crate::models::statistics::{UserCount, UserStatistics};
use crate::opts::UowOpts;
use crate::query::{QuoteOptions, Select};
use crate::response::{DbResponse, DbResult, Listing};
use crate::uow::{MysqlUow, QueryOpts};

/// Sources whose count queries feed [`StatisticsMapper::get_user_count_by_category`].
pub struct CountSources {
    pub pre_registrations: Arc<PreRegistrationMapper>,
    pub registrations: Arc<RegistrationMapper>,
    pub rsvps: Arc<RsvpMapper>,
    pub scanner: Arc<ScannerMapper>,
}

pub struct StatisticsMapper {
    base: GenericDataMapper,
    sql: Arc<MysqlUow>,
    hackathons: Arc<HackathonMapper>,
    sources: CountSources,
}

impl StatisticsMapper {
    pub const READ: &'static str = "statistics:read";

    pub fn new(
        acl: Arc<dyn AclRegistry>,
        sql: Arc<MysqlUow>,
        hackathons: Arc<HackathonMapper>,
        sources: CountSources,
    ) -> Self {
        let base = GenericDataMapper::new(acl);
        base.add_rbac(&[Self::READ], &[AuthLevel::TeamMember], None, &[AuthLevel::Volunteer]);
        Self {
            base,
            sql,
            hackathons,
            sources,
        }
    }

    pub fn acl(&self) -> &Arc<dyn AclRegistry> {
        self.base.acl()
    }

    /// One row of headcounts. Pre-registrations are counted across all
    /// hackathons; the other stages are scoped to `opts.hackathon`, or the
    /// active hackathon when none is given.
    pub async fn get_user_count_by_category(&self, opts: &UowOpts) -> DbResult<Vec<UserCount>> {
        let scoped = UowOpts {
            by_hackathon: true,
            ..opts.clone()
        };
        let query = Select::new(QuoteOptions::ALL)
            .from_query(self.sources.pre_registrations.count_query(&UowOpts::new()).await?, "a")
            .join_query(self.sources.registrations.count_query(&scoped).await?, "b")
            .join_query(self.sources.rsvps.count_query(&scoped).await?, "c")
            .join_query(self.sources.scanner.count_query(&scoped).await?, "d")
            .to_param()
            .terminated();
        let counts: Vec<UserCount> = self
            .sql
            .query_listing(&query, QueryOpts::cached(!opts.ignore_cache))
            .await?
            .collect()
            .await?;
        Ok(DbResponse::success(counts))
    }

    /// Every registration joined with its pre-registration, hackathon,
    /// RSVP and wristband rows.
    pub async fn get_all_user_data(&self, opts: &UowOpts) -> DbResult<Listing<UserStatistics>> {
        let hackathon = self.hackathons.scope(opts).await?;
        let select = Select::new(QuoteOptions::TABLES)
            .distinct()
            .field_as("pre_reg.uid", "pre_uid")
            .field("reg.*")
            .field_as("reg.pin - hackathon.base_pin", "pin")
            .fields([
                "hackathon.name",
                "hackathon.start_time",
                "hackathon.end_time",
                "hackathon.base_pin",
                "hackathon.active",
                "rsvp.user_id",
                "rsvp.rsvp_time",
                "rsvp.rsvp_status",
                "rfid.user_uid",
            ])
            .from_as(pre_registration_mapper::TABLE_NAME, "pre_reg")
            .right_join(registration_mapper::TABLE_NAME, "reg", "pre_reg.email = reg.email")
            .join(hackathon_mapper::TABLE_NAME, "hackathon", "reg.hackathon = hackathon.uid")
            .left_join(rsvp_mapper::TABLE_NAME, "rsvp", "reg.uid = rsvp.user_id")
            .left_join(scanner_mapper::TABLE_NAME, "rfid", "reg.uid = rfid.user_uid")
            .when(hackathon.is_some(), |q| q.filter("reg.hackathon = ?", hackathon.clone()));
        let query = with_page(select, opts).to_param().terminated();
        let listing = self.sql.query_listing(&query, opts.query_opts()).await?;
        Ok(DbResponse::success(listing))
    }
}

impl AclPerm for StatisticsMapper {
    fn permission(&self, operation: AclOperation) -> Option<&'static str> {
        match operation {
            AclOperation::Read => Some(Self::READ),
            _ => None,
        }
    }
}

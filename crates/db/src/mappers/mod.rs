//! One data mapper per entity family, and [`DataMappers`], which builds
//! them all over a shared ACL registry, unit of work and active-hackathon
//! resolver.

use std::sync::Arc;

use hackpsu_core::acl::AclRegistry;

use crate::directory::AuthDirectory;
use crate::live::LiveStore;
use crate::uow::MysqlUow;

pub mod active_hackathon;
pub mod admin_mapper;
pub mod attendance_mapper;
pub mod category_mapper;
pub mod checkout_item_mapper;
pub mod checkout_object_mapper;
pub mod event_mapper;
pub mod extra_credit_mapper;
pub mod hackathon_mapper;
pub mod location_mapper;
pub mod organizer_mapper;
pub mod pre_registration_mapper;
pub mod project_mapper;
pub mod registration_mapper;
pub mod rsvp_mapper;
pub mod scanner_mapper;
pub mod statistics_mapper;
pub mod travel_reimbursement_mapper;
pub mod update_mapper;
pub mod workshop_scan_mapper;

pub use admin_mapper::AdminMapper;
pub use attendance_mapper::AttendanceMapper;
pub use category_mapper::CategoryMapper;
pub use checkout_item_mapper::CheckoutItemMapper;
pub use checkout_object_mapper::CheckoutObjectMapper;
pub use event_mapper::EventMapper;
pub use extra_credit_mapper::ExtraCreditMapper;
pub use hackathon_mapper::HackathonMapper;
pub use location_mapper::LocationMapper;
pub use organizer_mapper::OrganizerMapper;
pub use pre_registration_mapper::PreRegistrationMapper;
pub use project_mapper::ProjectMapper;
pub use registration_mapper::RegistrationMapper;
pub use rsvp_mapper::RsvpMapper;
pub use scanner_mapper::ScannerMapper;
pub use statistics_mapper::{CountSources, StatisticsMapper};
pub use travel_reimbursement_mapper::TravelReimbursementMapper;
pub use update_mapper::UpdateMapper;
pub use workshop_scan_mapper::WorkshopScanMapper;

/// Every mapper, constructed once per process. Every mapper that scopes
/// by hackathon shares the one [`HackathonMapper`], so the active
/// hackathon is resolved at most once until it changes.
#[derive(Clone)]
pub struct DataMappers {
    pub acl: Arc<dyn AclRegistry>,
    pub admin: Arc<AdminMapper>,
    pub attendance: Arc<AttendanceMapper>,
    pub categories: Arc<CategoryMapper>,
    pub checkout_items: Arc<CheckoutItemMapper>,
    pub checkout_objects: Arc<CheckoutObjectMapper>,
    pub events: Arc<EventMapper>,
    pub extra_credit: Arc<ExtraCreditMapper>,
    pub hackathons: Arc<HackathonMapper>,
    pub locations: Arc<LocationMapper>,
    pub organizers: Arc<OrganizerMapper>,
    pub pre_registrations: Arc<PreRegistrationMapper>,
    pub projects: Arc<ProjectMapper>,
    pub registrations: Arc<RegistrationMapper>,
    pub rsvps: Arc<RsvpMapper>,
    pub scanner: Arc<ScannerMapper>,
    pub statistics: Arc<StatisticsMapper>,
    pub travel_reimbursements: Arc<TravelReimbursementMapper>,
    pub updates: Arc<UpdateMapper>,
    pub workshop_scans: Arc<WorkshopScanMapper>,
}

impl DataMappers {
    pub fn new(
        acl: Arc<dyn AclRegistry>,
        sql: Arc<MysqlUow>,
        directory: Arc<dyn AuthDirectory>,
        live: Arc<dyn LiveStore>,
    ) -> Self {
        let hackathons = Arc::new(HackathonMapper::new(acl.clone(), sql.clone()));
        let pre_registrations = Arc::new(PreRegistrationMapper::new(acl.clone(), sql.clone(), hackathons.clone()));
        let registrations = Arc::new(RegistrationMapper::new(acl.clone(), sql.clone(), hackathons.clone()));
        let rsvps = Arc::new(RsvpMapper::new(acl.clone(), sql.clone(), hackathons.clone()));
        let scanner = Arc::new(ScannerMapper::new(acl.clone(), sql.clone(), hackathons.clone()));
        let statistics = Arc::new(StatisticsMapper::new(
            acl.clone(),
            sql.clone(),
            hackathons.clone(),
            CountSources {
                pre_registrations: pre_registrations.clone(),
                registrations: registrations.clone(),
                rsvps: rsvps.clone(),
                scanner: scanner.clone(),
            },
        ));

        Self {
            admin: Arc::new(AdminMapper::new(acl.clone(), sql.clone(), directory)),
            attendance: Arc::new(AttendanceMapper::new(acl.clone(), sql.clone(), hackathons.clone())),
            categories: Arc::new(CategoryMapper::new(acl.clone(), sql.clone())),
            checkout_items: Arc::new(CheckoutItemMapper::new(acl.clone(), sql.clone())),
            checkout_objects: Arc::new(CheckoutObjectMapper::new(acl.clone(), sql.clone(), hackathons.clone())),
            events: Arc::new(EventMapper::new(acl.clone(), sql.clone(), hackathons.clone())),
            extra_credit: Arc::new(ExtraCreditMapper::new(acl.clone(), sql.clone(), hackathons.clone())),
            locations: Arc::new(LocationMapper::new(acl.clone(), sql.clone())),
            organizers: Arc::new(OrganizerMapper::new(acl.clone(), sql.clone())),
            projects: Arc::new(ProjectMapper::new(acl.clone(), sql.clone(), hackathons.clone())),
            travel_reimbursements: Arc::new(TravelReimbursementMapper::new(acl.clone(), sql.clone(), hackathons.clone())),
            updates: Arc::new(UpdateMapper::new(acl.clone(), live, hackathons.clone())),
            workshop_scans: Arc::new(WorkshopScanMapper::new(acl.clone(), sql, hackathons.clone())),
            acl,
            hackathons,
            pre_registrations,
            registrations,
            rsvps,
            scanner,
            statistics,
        }
    }
}

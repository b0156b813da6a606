//! Row types and response shapes for every domain entity.
//!
//! Enum-valued columns are carried as strings on the row structs; the typed
//! enums in [`enums`] are applied at the validation boundary.

pub mod case;
pub mod client;
pub mod document;
pub mod enums;
pub mod incident;
pub mod insurance;
pub mod medical;

pub use case::{
    AssignmentWithUser, Case, CaseNote, CaseOverview, CaseStatistics, CaseTask,
    CaseWithRelations, PolicyProjection, StatusCount, TimelineEntry, UserSummary,
};
pub use client::{
    Client, ClientContact, ClientWithRelations, CommunicationPreferences, EmergencyContact,
    Employment, FamilyMember,
};
pub use document::{DocumentSummary, DocumentWithUploader};
pub use enums::{
    CaseStatus, CaseType, ClaimStatus, DocumentType, IncidentSeverity, InjurySeverity,
    InvalidEnumValue, PolicyStatus, PolicyType, ProviderStatus, TaskStatus,
};
pub use incident::{
    Citation, Incident, IncidentEvidence, IncidentVehicle, IncidentWitness, IncidentWithRelations,
    PoliceReport, PoliceReportWithCitations,
};
pub use insurance::{
    ClaimStatusGroup, CoverageAnalysis, CoverageBucket, CoveragePolicy, InsuranceClaim,
    InsurancePolicy, InsuranceSummary, PolicyTypeGroup, PolicyWithClaims,
};
pub use medical::{
    Injury, InjurySeverityGroup, MedicalProvider, MedicalRecord, MedicalSummary,
    ProviderWithRecords,
};

//! Care voucher creation wizard.
//!
//! Two steps: find and select a member (optionally checking dues), then fill
//! the voucher details and submit.

use chrono::Local;
use tracing::warn;

use super::{Alert, Seq, Sequencer, prune_alerts};
use crate::api::{DailyStats, Doctor, DuesStatus, IssuedVoucher, MemberSummary, NewVoucher};
use crate::error::{AppError, Result};

const MSG_QUERY_TOO_SHORT: &str = "Veuillez saisir au moins {n} caractères";
const MSG_SELECT_MEMBER: &str = "Veuillez sélectionner un membre";
const MSG_INVALID_AMOUNT: &str = "Veuillez saisir un montant maximum valide";
const MSG_MISSING_REASON: &str = "Veuillez décrire le motif de consultation";
const MSG_MISSING_DOCTOR: &str = "Veuillez sélectionner un médecin";
const MSG_SEARCH_FAILED: &str = "Erreur lors de la recherche";
const MSG_CREATE_FAILED: &str = "Erreur lors de la création du bon";
const MSG_DOCTORS_FAILED: &str = "Impossible de charger la liste des médecins";

/// Wizard step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FormStep {
    #[default]
    MemberSelection,
    VoucherDetails,
}

/// Member chosen for the voucher.
#[derive(Debug, Clone, PartialEq)]
pub struct SelectedMember {
    pub id: i64,
    pub full_name: String,
    pub member_number: String,
    pub phone: String,
    pub registration_date: String,
}

impl From<&MemberSummary> for SelectedMember {
    fn from(m: &MemberSummary) -> Self {
        Self {
            id: m.id,
            full_name: m.full_name.clone(),
            member_number: m.member_number.clone(),
            phone: m.phone.clone(),
            registration_date: m.registration_date.clone(),
        }
    }
}

/// Search result area.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum SearchState {
    #[default]
    Hidden,
    Loading,
    Results(Vec<MemberSummary>),
    NoResults,
}

/// Dues verification area. Exactly one state is shown at a time.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum DuesDisplay {
    #[default]
    Empty,
    Checking,
    UpToDate { next_due: Option<String> },
    Overdue { last_due: Option<String> },
    Failed,
}

impl From<DuesStatus> for DuesDisplay {
    fn from(status: DuesStatus) -> Self {
        if status.up_to_date {
            Self::UpToDate {
                next_due: status.due_date,
            }
        } else {
            Self::Overdue {
                last_due: status.due_date,
            }
        }
    }
}

/// Step 2 inputs, as typed.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct VoucherForm {
    pub amount: String,
    pub reason: String,
    pub doctor_id: Option<i64>,
}

/// Shown after the server issued a voucher.
#[derive(Debug, Clone, PartialEq)]
pub struct Confirmation {
    pub code: String,
    pub expires_on: String,
    pub max_amount: String,
    pub doctor: String,
}

/// Network work requested by the wizard.
#[derive(Debug, Clone, PartialEq)]
pub enum Request {
    SearchMembers { seq: Seq, query: String },
    VerifyDues { seq: Seq, member_id: i64 },
    LoadDoctors,
    LoadStats,
    CreateVoucher(NewVoucher),
}

/// Outcome of a [`Request`].
#[derive(Debug)]
pub enum Response {
    MembersFound { seq: Seq, result: Result<Vec<MemberSummary>> },
    DuesChecked { seq: Seq, result: Result<DuesStatus> },
    DoctorsLoaded(Result<Vec<Doctor>>),
    StatsLoaded(Result<DailyStats>),
    VoucherCreated(Result<IssuedVoucher>),
}

/// Voucher wizard state.
#[derive(Debug)]
pub struct VoucherWizard {
    min_search_length: usize,
    /// Search box contents.
    pub search_query: String,
    search: SearchState,
    search_seq: Sequencer,
    selected: Option<SelectedMember>,
    dues: DuesDisplay,
    dues_seq: Sequencer,
    step: FormStep,
    /// Step 2 inputs.
    pub form: VoucherForm,
    submitting: bool,
    doctors: Vec<Doctor>,
    stats: Option<DailyStats>,
    confirmation: Option<Confirmation>,
    alerts: Vec<Alert>,
}

impl VoucherWizard {
    pub fn new(min_search_length: usize) -> Self {
        Self {
            min_search_length,
            search_query: String::new(),
            search: SearchState::default(),
            search_seq: Sequencer::default(),
            selected: None,
            dues: DuesDisplay::default(),
            dues_seq: Sequencer::default(),
            step: FormStep::default(),
            form: VoucherForm::default(),
            submitting: false,
            doctors: Vec::new(),
            stats: None,
            confirmation: None,
            alerts: Vec::new(),
        }
    }

    // Accessors

    pub fn search_state(&self) -> &SearchState {
        &self.search
    }

    pub fn selected(&self) -> Option<&SelectedMember> {
        self.selected.as_ref()
    }

    pub fn dues(&self) -> &DuesDisplay {
        &self.dues
    }

    pub fn step(&self) -> FormStep {
        self.step
    }

    pub fn can_advance(&self) -> bool {
        self.selected.is_some()
    }

    pub fn is_submitting(&self) -> bool {
        self.submitting
    }

    pub fn doctors(&self) -> &[Doctor] {
        &self.doctors
    }

    pub fn stats(&self) -> Option<DailyStats> {
        self.stats
    }

    pub fn confirmation(&self) -> Option<&Confirmation> {
        self.confirmation.as_ref()
    }

    pub fn alerts(&self) -> &[Alert] {
        &self.alerts
    }

    pub fn prune_alerts(&mut self) {
        prune_alerts(&mut self.alerts, Local::now());
    }

    pub fn dismiss_alert(&mut self, index: usize) {
        if index < self.alerts.len() {
            self.alerts.remove(index);
        }
    }

    // Step 1: member selection

    /// Explicit search (button or Enter).
    pub fn search(&mut self, query: &str) -> Option<Request> {
        let query = query.trim();
        if query.chars().count() < self.min_search_length {
            self.alerts.push(Alert::warning(
                MSG_QUERY_TOO_SHORT.replace("{n}", &self.min_search_length.to_string()),
            ));
            return None;
        }

        self.search = SearchState::Loading;
        Some(Request::SearchMembers {
            seq: self.search_seq.next(),
            query: query.to_string(),
        })
    }

    /// Search-as-you-type: only fires once the query is long enough, silently.
    pub fn on_query_changed(&mut self) -> Option<Request> {
        if self.search_query.trim().chars().count() >= self.min_search_length {
            let query = self.search_query.clone();
            self.search(&query)
        } else {
            None
        }
    }

    pub fn select(&mut self, member: &MemberSummary) {
        self.selected = Some(SelectedMember::from(member));
        self.search_query = member.full_name.clone();
        self.search = SearchState::Hidden;
        self.search_seq.invalidate();
        self.clear_dues();
    }

    pub fn deselect(&mut self) {
        self.selected = None;
        self.search_query.clear();
        self.search = SearchState::Hidden;
        self.search_seq.invalidate();
        self.clear_dues();
    }

    fn clear_dues(&mut self) {
        self.dues = DuesDisplay::Empty;
        self.dues_seq.invalidate();
    }

    pub fn verify_dues(&mut self) -> Option<Request> {
        let member_id = self.selected.as_ref()?.id;
        self.dues = DuesDisplay::Checking;
        Some(Request::VerifyDues {
            seq: self.dues_seq.next(),
            member_id,
        })
    }

    // Navigation

    /// Move to the details step. Refused without a selected member.
    pub fn advance(&mut self) -> bool {
        if self.selected.is_none() {
            self.alerts.push(Alert::warning(MSG_SELECT_MEMBER));
            return false;
        }
        self.step = FormStep::VoucherDetails;
        true
    }

    pub fn back(&mut self) {
        self.step = FormStep::MemberSelection;
    }

    // Step 2: details and submission

    pub fn load_doctors(&self) -> Request {
        Request::LoadDoctors
    }

    pub fn refresh_stats(&self) -> Request {
        Request::LoadStats
    }

    pub fn doctor_label(&self, doctor_id: i64) -> Option<String> {
        self.doctors.iter().find(|d| d.id == doctor_id).map(Doctor::label)
    }

    /// Validate the form and build the creation request.
    ///
    /// While a submission is in flight, further submits are ignored.
    pub fn submit(&mut self) -> Option<Request> {
        if self.submitting {
            return None;
        }

        let Some(member_id) = self.selected.as_ref().map(|m| m.id) else {
            self.alerts.push(Alert::warning(MSG_SELECT_MEMBER));
            return None;
        };

        let amount = self.form.amount.trim();
        let amount_ok = amount
            .replace(',', ".")
            .parse::<f64>()
            .map(|v| v.is_finite() && v > 0.0)
            .unwrap_or(false);
        if !amount_ok {
            self.alerts.push(Alert::warning(MSG_INVALID_AMOUNT));
            return None;
        }

        if self.form.reason.trim().is_empty() {
            self.alerts.push(Alert::warning(MSG_MISSING_REASON));
            return None;
        }

        let Some(doctor_id) = self.form.doctor_id else {
            self.alerts.push(Alert::warning(MSG_MISSING_DOCTOR));
            return None;
        };

        self.submitting = true;
        Some(Request::CreateVoucher(NewVoucher {
            member_id,
            max_amount: amount.to_string(),
            reason: self.form.reason.trim().to_string(),
            doctor_id,
        }))
    }

    /// Reset everything for another voucher and close the confirmation.
    pub fn start_new_voucher(&mut self) {
        self.form = VoucherForm::default();
        self.deselect();
        self.back();
        self.search = SearchState::Hidden;
        self.confirmation = None;
        self.submitting = false;
    }

    /// Apply a response. May return a follow-up request.
    pub fn apply(&mut self, response: Response) -> Option<Request> {
        match response {
            Response::MembersFound { seq, result } => {
                if !self.search_seq.is_current(seq) {
                    return None;
                }
                match result {
                    Ok(members) if members.is_empty() => self.search = SearchState::NoResults,
                    Ok(members) => self.search = SearchState::Results(members),
                    Err(e) => {
                        warn!("Member search failed: {e}");
                        self.search = SearchState::Hidden;
                        self.alerts.push(Alert::danger(MSG_SEARCH_FAILED));
                    }
                }
                None
            }
            Response::DuesChecked { seq, result } => {
                if !self.dues_seq.is_current(seq) {
                    return None;
                }
                self.dues = match result {
                    Ok(status) => DuesDisplay::from(status),
                    Err(e) => {
                        warn!("Dues verification failed: {e}");
                        DuesDisplay::Failed
                    }
                };
                None
            }
            Response::DoctorsLoaded(result) => {
                match result {
                    Ok(doctors) => self.doctors = doctors,
                    Err(e) => {
                        warn!("Doctor list failed to load: {e}");
                        self.alerts.push(Alert::warning(MSG_DOCTORS_FAILED));
                    }
                }
                None
            }
            Response::StatsLoaded(result) => {
                match result {
                    Ok(stats) => self.stats = Some(stats),
                    Err(e) => warn!("Daily stats failed to load: {e}"),
                }
                None
            }
            Response::VoucherCreated(result) => match result {
                Ok(issued) => {
                    let doctor = self
                        .form
                        .doctor_id
                        .and_then(|id| self.doctor_label(id))
                        .unwrap_or_default();
                    self.confirmation = Some(Confirmation {
                        code: issued.code,
                        expires_on: issued.expires_on,
                        max_amount: issued.max_amount,
                        doctor,
                    });
                    Some(Request::LoadStats)
                }
                Err(AppError::Server(message)) => {
                    self.submitting = false;
                    self.alerts.push(Alert::danger(format!("Erreur: {message}")));
                    None
                }
                Err(e) => {
                    warn!("Voucher creation failed: {e}");
                    self.submitting = false;
                    self.alerts.push(Alert::danger(MSG_CREATE_FAILED));
                    None
                }
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::controllers::AlertLevel;

    fn member(id: i64, name: &str) -> MemberSummary {
        MemberSummary {
            id,
            full_name: name.to_string(),
            member_number: format!("M-{id:04}"),
            phone: "+225 07 00 00 00".to_string(),
            registration_date: "2023-05-12".to_string(),
        }
    }

    fn doctor(id: i64) -> Doctor {
        Doctor {
            id,
            name: "Koné".to_string(),
            specialty: "Généraliste".to_string(),
        }
    }

    fn wizard_with_member() -> VoucherWizard {
        let mut wizard = VoucherWizard::new(3);
        wizard.select(&member(7, "Jean Dupont"));
        wizard
    }

    fn filled_wizard() -> VoucherWizard {
        let mut wizard = wizard_with_member();
        wizard.apply(Response::DoctorsLoaded(Ok(vec![doctor(3)])));
        wizard.form = VoucherForm {
            amount: "15000".to_string(),
            reason: "Fièvre persistante".to_string(),
            doctor_id: Some(3),
        };
        wizard
    }

    fn issue_search(wizard: &mut VoucherWizard, query: &str) -> Seq {
        match wizard.search(query) {
            Some(Request::SearchMembers { seq, .. }) => seq,
            other => panic!("expected search request, got {other:?}"),
        }
    }

    #[test]
    fn test_short_query_issues_no_request() {
        let mut wizard = VoucherWizard::new(3);
        assert_eq!(wizard.search("Je"), None);
        assert_eq!(wizard.search("  Je  "), None);
        assert_eq!(wizard.alerts().len(), 2);
        assert_eq!(wizard.alerts()[0].level, AlertLevel::Warning);
        assert_eq!(wizard.alerts()[0].message, "Veuillez saisir au moins 3 caractères");
        assert_eq!(*wizard.search_state(), SearchState::Hidden);
    }

    #[test]
    fn test_search_as_you_type_is_silent_below_minimum() {
        let mut wizard = VoucherWizard::new(3);
        wizard.search_query = "Je".to_string();
        assert_eq!(wizard.on_query_changed(), None);
        assert!(wizard.alerts().is_empty());

        wizard.search_query = "Jea".to_string();
        assert!(matches!(
            wizard.on_query_changed(),
            Some(Request::SearchMembers { ref query, .. }) if query == "Jea"
        ));
    }

    #[test]
    fn test_search_then_select_enables_next() {
        let mut wizard = VoucherWizard::new(3);
        let seq = issue_search(&mut wizard, "Jea");
        assert_eq!(*wizard.search_state(), SearchState::Loading);

        wizard.apply(Response::MembersFound {
            seq,
            result: Ok(vec![member(7, "Jean Dupont")]),
        });
        let SearchState::Results(results) = wizard.search_state().clone() else {
            panic!("expected results");
        };
        assert_eq!(results.len(), 1);
        assert!(!wizard.can_advance());

        wizard.select(&results[0]);
        let selected = wizard.selected().unwrap();
        assert_eq!(selected.id, 7);
        assert_eq!(selected.member_number, "M-0007");
        assert_eq!(wizard.search_query, "Jean Dupont");
        assert_eq!(*wizard.search_state(), SearchState::Hidden);
        assert!(wizard.can_advance());
    }

    #[test]
    fn test_empty_result_shows_no_results() {
        let mut wizard = VoucherWizard::new(3);
        let seq = issue_search(&mut wizard, "Zzz");
        wizard.apply(Response::MembersFound { seq, result: Ok(vec![]) });
        assert_eq!(*wizard.search_state(), SearchState::NoResults);
    }

    #[test]
    fn test_search_failure_is_non_blocking() {
        let mut wizard = VoucherWizard::new(3);
        let seq = issue_search(&mut wizard, "Jea");
        wizard.apply(Response::MembersFound {
            seq,
            result: Err(AppError::Status(500)),
        });

        assert_eq!(wizard.alerts().last().unwrap().message, "Erreur lors de la recherche");
        assert!(wizard.search("Jean").is_some());
    }

    #[test]
    fn test_stale_search_response_ignored() {
        let mut wizard = VoucherWizard::new(3);
        let old = issue_search(&mut wizard, "Jea");
        let new = issue_search(&mut wizard, "Jean");

        wizard.apply(Response::MembersFound {
            seq: new,
            result: Ok(vec![member(7, "Jean Dupont")]),
        });
        wizard.apply(Response::MembersFound {
            seq: old,
            result: Ok(vec![]),
        });

        assert!(matches!(wizard.search_state(), SearchState::Results(r) if r.len() == 1));
    }

    #[test]
    fn test_select_clears_previous_dues_display() {
        let mut wizard = wizard_with_member();
        let Some(Request::VerifyDues { seq, member_id }) = wizard.verify_dues() else {
            panic!("expected dues request");
        };
        assert_eq!(member_id, 7);
        wizard.apply(Response::DuesChecked {
            seq,
            result: Ok(DuesStatus {
                up_to_date: true,
                due_date: None,
            }),
        });
        assert!(matches!(wizard.dues(), DuesDisplay::UpToDate { .. }));

        wizard.select(&member(8, "Jeanne Kouassi"));
        assert_eq!(*wizard.dues(), DuesDisplay::Empty);
        assert!(wizard.can_advance());
    }

    #[test]
    fn test_dues_response_for_previous_member_ignored() {
        let mut wizard = wizard_with_member();
        let Some(Request::VerifyDues { seq, .. }) = wizard.verify_dues() else {
            panic!("expected dues request");
        };
        wizard.select(&member(8, "Jeanne Kouassi"));

        wizard.apply(Response::DuesChecked {
            seq,
            result: Ok(DuesStatus {
                up_to_date: false,
                due_date: None,
            }),
        });
        assert_eq!(*wizard.dues(), DuesDisplay::Empty);
    }

    #[test]
    fn test_overdue_member_shows_last_due_date() {
        let mut wizard = wizard_with_member();
        let Some(Request::VerifyDues { seq, .. }) = wizard.verify_dues() else {
            panic!("expected dues request");
        };
        assert_eq!(*wizard.dues(), DuesDisplay::Checking);

        wizard.apply(Response::DuesChecked {
            seq,
            result: Ok(DuesStatus {
                up_to_date: false,
                due_date: Some("2024-01-01".to_string()),
            }),
        });
        assert_eq!(
            *wizard.dues(),
            DuesDisplay::Overdue {
                last_due: Some("2024-01-01".to_string())
            }
        );
    }

    #[test]
    fn test_dues_failure_renders_failed_state() {
        let mut wizard = wizard_with_member();
        let Some(Request::VerifyDues { seq, .. }) = wizard.verify_dues() else {
            panic!("expected dues request");
        };
        wizard.apply(Response::DuesChecked {
            seq,
            result: Err(AppError::parse("expected value")),
        });
        assert_eq!(*wizard.dues(), DuesDisplay::Failed);
    }

    #[test]
    fn test_verify_dues_without_member_does_nothing() {
        let mut wizard = VoucherWizard::new(3);
        assert_eq!(wizard.verify_dues(), None);
        assert_eq!(*wizard.dues(), DuesDisplay::Empty);
    }

    #[test]
    fn test_advance_without_member_rejected() {
        let mut wizard = VoucherWizard::new(3);
        assert!(!wizard.advance());
        assert_eq!(wizard.step(), FormStep::MemberSelection);
        assert_eq!(wizard.alerts()[0].message, "Veuillez sélectionner un membre");
    }

    #[test]
    fn test_advance_and_back() {
        let mut wizard = wizard_with_member();
        assert!(wizard.advance());
        assert_eq!(wizard.step(), FormStep::VoucherDetails);
        wizard.back();
        assert_eq!(wizard.step(), FormStep::MemberSelection);
    }

    #[test]
    fn test_deselect_disables_next() {
        let mut wizard = wizard_with_member();
        wizard.deselect();
        assert!(!wizard.can_advance());
        assert!(wizard.search_query.is_empty());
        assert!(!wizard.advance());
    }

    #[test]
    fn test_search_response_after_deselect_ignored() {
        let mut wizard = VoucherWizard::new(3);
        let seq = issue_search(&mut wizard, "Jea");
        wizard.select(&member(7, "Jean Dupont"));
        let late = issue_search(&mut wizard, "Mar");

        wizard.deselect();
        wizard.apply(Response::MembersFound {
            seq: late,
            result: Ok(vec![member(9, "Marie Koffi")]),
        });
        wizard.apply(Response::MembersFound {
            seq,
            result: Ok(vec![member(8, "Jeanne Yao")]),
        });

        assert_eq!(*wizard.search_state(), SearchState::Hidden);
        assert!(wizard.selected().is_none());
        assert!(wizard.search_query.is_empty());
    }

    #[test]
    fn test_zero_amount_blocked() {
        let mut wizard = filled_wizard();
        wizard.form.amount = "0".to_string();
        assert_eq!(wizard.submit(), None);
        assert!(!wizard.is_submitting());
        assert_eq!(wizard.alerts().last().unwrap().message, "Veuillez saisir un montant maximum valide");
    }

    #[test]
    fn test_invalid_amounts_blocked() {
        for amount in ["", "abc", "-5", "NaN", "inf"] {
            let mut wizard = filled_wizard();
            wizard.form.amount = amount.to_string();
            assert_eq!(wizard.submit(), None, "amount {amount:?} should be rejected");
        }
    }

    #[test]
    fn test_blank_reason_and_missing_doctor_blocked() {
        let mut wizard = filled_wizard();
        wizard.form.reason = "   ".to_string();
        assert_eq!(wizard.submit(), None);
        assert_eq!(wizard.alerts().last().unwrap().message, "Veuillez décrire le motif de consultation");

        let mut wizard = filled_wizard();
        wizard.form.doctor_id = None;
        assert_eq!(wizard.submit(), None);
        assert_eq!(wizard.alerts().last().unwrap().message, "Veuillez sélectionner un médecin");
    }

    #[test]
    fn test_submit_builds_payload_and_guards_double_submit() {
        let mut wizard = filled_wizard();
        wizard.form.amount = " 12500,50 ".to_string();

        let request = wizard.submit();
        assert_eq!(
            request,
            Some(Request::CreateVoucher(NewVoucher {
                member_id: 7,
                max_amount: "12500,50".to_string(),
                reason: "Fièvre persistante".to_string(),
                doctor_id: 3,
            }))
        );
        assert!(wizard.is_submitting());
        assert_eq!(wizard.submit(), None);
    }

    #[test]
    fn test_successful_submit_shows_confirmation_and_refreshes_stats_once() {
        let mut wizard = filled_wizard();
        assert!(wizard.submit().is_some());

        let follow_up = wizard.apply(Response::VoucherCreated(Ok(IssuedVoucher {
            code: "BS-2024-0042".to_string(),
            expires_on: "2024-02-15".to_string(),
            max_amount: "15000".to_string(),
        })));

        assert_eq!(follow_up, Some(Request::LoadStats));
        let confirmation = wizard.confirmation().unwrap();
        assert_eq!(confirmation.code, "BS-2024-0042");
        assert_eq!(confirmation.expires_on, "2024-02-15");
        assert_eq!(confirmation.max_amount, "15000");
        assert_eq!(confirmation.doctor, "Dr. Koné - Généraliste");

        let follow_up = wizard.apply(Response::StatsLoaded(Ok(DailyStats {
            vouchers_today: 4,
            remaining_quota: 6,
        })));
        assert_eq!(follow_up, None);
        assert_eq!(wizard.stats().unwrap().vouchers_today, 4);
    }

    #[test]
    fn test_server_failure_message_verbatim_and_reenabled() {
        let mut wizard = filled_wizard();
        assert!(wizard.submit().is_some());

        let follow_up = wizard.apply(Response::VoucherCreated(Err(AppError::server(
            "Limite quotidienne atteinte",
        ))));

        assert_eq!(follow_up, None);
        assert!(!wizard.is_submitting());
        assert!(wizard.confirmation().is_none());
        assert_eq!(wizard.alerts().last().unwrap().message, "Erreur: Limite quotidienne atteinte");
        assert!(wizard.submit().is_some());
    }

    #[test]
    fn test_transport_failure_reenables_with_generic_message() {
        let mut wizard = filled_wizard();
        assert!(wizard.submit().is_some());
        wizard.apply(Response::VoucherCreated(Err(AppError::Status(502))));

        assert!(!wizard.is_submitting());
        assert_eq!(wizard.alerts().last().unwrap().message, "Erreur lors de la création du bon");
    }

    #[test]
    fn test_start_new_voucher_resets_wizard() {
        let mut wizard = filled_wizard();
        assert!(wizard.advance());
        assert!(wizard.submit().is_some());
        wizard.apply(Response::VoucherCreated(Ok(IssuedVoucher {
            code: "BS-1".to_string(),
            expires_on: "2024-02-15".to_string(),
            max_amount: "15000".to_string(),
        })));

        wizard.start_new_voucher();
        assert!(wizard.confirmation().is_none());
        assert!(wizard.selected().is_none());
        assert_eq!(wizard.step(), FormStep::MemberSelection);
        assert_eq!(wizard.form, VoucherForm::default());
        assert!(!wizard.is_submitting());
        assert_eq!(wizard.doctors().len(), 1);
    }

    #[test]
    fn test_doctor_list_failure_is_non_fatal() {
        let mut wizard = VoucherWizard::new(3);
        wizard.apply(Response::DoctorsLoaded(Err(AppError::Status(404))));
        assert!(wizard.doctors().is_empty());
        assert_eq!(wizard.alerts().len(), 1);

        wizard.apply(Response::StatsLoaded(Err(AppError::Status(500))));
        assert!(wizard.stats().is_none());
        assert_eq!(wizard.alerts().len(), 1);
    }
}

use super::classifier::MailCategory;
use crate::config::RoutingConfig;

/// Maps mail categories to department mailboxes.
#[derive(Debug, Clone)]
pub struct DepartmentRoutes {
    routes: RoutingConfig,
}

impl DepartmentRoutes {
    pub fn new(routes: RoutingConfig) -> Self {
        Self { routes }
    }

    pub fn mailbox(&self, category: MailCategory) -> &str {
        match category {
            MailCategory::Complaint => &self.routes.complaints,
            MailCategory::RentIssue => &self.routes.arrears,
            MailCategory::ServiceRequest => &self.routes.repairs,
            MailCategory::Legal => &self.routes.legal,
            MailCategory::Praise => &self.routes.customer_service,
            MailCategory::GeneralInquiry => &self.routes.support,
        }
    }
}

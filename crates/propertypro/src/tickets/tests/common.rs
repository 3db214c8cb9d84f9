use crate::accounts::{Role, User};
use crate::properties::{NewProperty, Property, PropertyId, PropertyStatus, PropertyType};
use crate::testing::TestApi;
use crate::tickets::{NewTicket, TicketPriority};

pub(super) fn draft(title: &str) -> NewTicket {
    NewTicket {
        title: title.to_string(),
        description: format!("{title}: emergency maintenance needed in the kitchen"),
        category: "maintenance".to_string(),
        priority: TicketPriority::Medium,
        property_id: None,
    }
}

pub(super) fn draft_for(title: &str, property: PropertyId) -> NewTicket {
    NewTicket {
        property_id: Some(property),
        ..draft(title)
    }
}

pub(super) async fn admin_and_tenant(api: &TestApi) -> ((User, String), (User, String)) {
    let admin = api.seed_user(Role::Admin, "owner@example.com").await;
    let tenant = api.seed_user(Role::Tenant, "tess@example.com").await;
    (admin, tenant)
}

pub(super) async fn owned_property(api: &TestApi, owner: &User) -> Property {
    api.state
        .properties
        .create(
            owner,
            NewProperty {
                address: "21 Canal Walk".to_string(),
                property_type: PropertyType::Apartment,
                size: 580.0,
                bedrooms: 1,
                bathrooms: 1,
                rent_amount: 1100.0,
                status: PropertyStatus::Rented,
            },
        )
        .await
        .expect("admin creates property")
}

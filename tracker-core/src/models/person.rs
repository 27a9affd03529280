//! People and project memberships

use crate::document::Element;
use crate::error::Result;
use crate::wire::{EntityDescriptor, FieldWriter, WireEntity, read_int, read_text};
use serde::Serialize;

/// A person known to the service
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Person {
    pub email: Option<String>,
    pub name: Option<String>,
    pub initials: Option<String>,
}

impl Person {
    pub fn new(name: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            email: Some(email.into()),
            initials: None,
        }
    }

    pub fn with_initials(mut self, initials: impl Into<String>) -> Self {
        self.initials = Some(initials.into());
        self
    }
}

impl WireEntity for Person {
    const DESCRIPTOR: EntityDescriptor = EntityDescriptor {
        root: "person",
        excluded: &[],
        drop_null_markers: true,
    };

    fn to_element(&self) -> Element {
        FieldWriter::new(Self::DESCRIPTOR.root)
            .text("email", self.email.as_deref())
            .text("name", self.name.as_deref())
            .text("initials", self.initials.as_deref())
            .finish()
    }

    fn from_element(element: &Element) -> Result<Self> {
        Ok(Self {
            email: read_text(element, "email"),
            name: read_text(element, "name"),
            initials: read_text(element, "initials"),
        })
    }
}

/// A person's role on a project
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Membership {
    pub id: Option<i64>,
    pub person: Option<Person>,
    pub role: Option<String>,
}

impl Membership {
    pub fn new(person: Person, role: impl Into<String>) -> Self {
        Self {
            id: None,
            person: Some(person),
            role: Some(role.into()),
        }
    }
}

impl WireEntity for Membership {
    const DESCRIPTOR: EntityDescriptor = EntityDescriptor {
        root: "membership",
        excluded: &["id"],
        drop_null_markers: true,
    };

    fn to_element(&self) -> Element {
        let writer = FieldWriter::new(Self::DESCRIPTOR.root).int("id", self.id);
        let writer = match &self.person {
            Some(person) => writer.child(person.to_element()),
            None => writer.child(Element::nil("person")),
        };
        writer.text("role", self.role.as_deref()).finish()
    }

    fn from_element(element: &Element) -> Result<Self> {
        let person = element
            .child("person")
            .filter(|p| !p.is_nil())
            .map(Person::from_element)
            .transpose()?;

        Ok(Self {
            id: read_int(element, "id")?,
            person,
            role: read_text(element, "role"),
        })
    }
}

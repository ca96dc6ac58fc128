//! Persons: the people meals are served to, and the people behind accounts.

use crate::{
    dal::{NewPerson, DB},
    logic::{checked, found, invalid, parse_date, required},
    schema::{MealRow, Person},
};
use failure::Fallible;
use log::info;
use serde_derive::{Deserialize, Serialize};

/// The form a person is created or updated with.
#[derive(Clone, Debug, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct PersonForm {
    /// The person's name.
    pub name: String,

    /// The person's birthdate, as `YYYY-MM-DD`.
    pub birthdate: String,

    /// The person's gender.
    pub gender: String,

    /// The person's weight.
    pub weight: String,

    /// Present when the "active" checkbox is checked. Ignored on creation.
    pub active: Option<String>,
}

impl From<&Person> for PersonForm {
    fn from(person: &Person) -> PersonForm {
        PersonForm {
            name: person.name.clone(),
            birthdate: person.birthdate.format("%Y-%m-%d").to_string(),
            gender: person.gender.clone(),
            weight: person.weight.to_string(),
            active: if person.active {
                Some("1".to_owned())
            } else {
                None
            },
        }
    }
}

impl PersonForm {
    fn validate(&self, active: bool) -> Fallible<NewPerson> {
        let name = required(&self.name, "Name is required.")?;
        let birthdate = parse_date(&self.birthdate, "You must enter a valid birthdate.")?;
        let gender = required(&self.gender, "You must select a gender.")?;
        let weight = required(&self.weight, "You must enter a weight.")?;
        let weight = match weight.parse::<f64>() {
            Ok(weight) if weight.is_finite() && weight > 0.0 => weight,
            _ => return invalid("You must enter a valid weight."),
        };

        Ok(NewPerson {
            name: name.to_owned(),
            birthdate,
            gender: gender.to_owned(),
            weight,
            active,
        })
    }
}

/// Lists every person, deleted ones included.
pub async fn list(db: &DB) -> Fallible<Vec<Person>> {
    db.list_persons().await
}

/// Lists the persons that haven't been deleted, for accounts to be linked to.
pub async fn list_active(db: &DB) -> Fallible<Vec<Person>> {
    db.list_active_persons().await
}

/// Gets a person.
pub async fn get(db: &DB, id: i32) -> Fallible<Person> {
    found(db.get_person(id).await?, "Person", id)
}

/// Gets a person, along with the meals they were served.
pub async fn info(db: &DB, id: i32) -> Fallible<(Person, Vec<MealRow>)> {
    let person = get(db, id).await?;
    let meals = db.list_meal_rows_for_candidate(id).await?;
    Ok((person, meals))
}

/// Creates a person, returning their ID.
pub async fn create(db: &DB, form: &PersonForm) -> Fallible<i32> {
    let person = form.validate(true)?;
    let id = db.create_person(person).await?;
    info!("Created person {}", id);
    Ok(id)
}

/// Updates a person.
pub async fn update(db: &DB, id: i32, form: &PersonForm) -> Fallible<()> {
    let _ = get(db, id).await?;
    let person = form.validate(checked(&form.active))?;
    db.update_person(id, person).await
}

/// Marks a person as deleted.
pub async fn delete(db: &DB, id: i32) -> Fallible<()> {
    let _ = get(db, id).await?;
    db.deactivate_person(id).await?;
    info!("Deleted person {}", id);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::PersonForm;
    use crate::logic::{as_refusal, Refusal};

    fn form() -> PersonForm {
        PersonForm {
            name: "Alice".to_owned(),
            birthdate: "1991-08-27".to_owned(),
            gender: "F".to_owned(),
            weight: "61.5".to_owned(),
            active: None,
        }
    }

    fn refusal(form: PersonForm) -> String {
        let err = form.validate(true).unwrap_err();
        match as_refusal(&err) {
            Some(Refusal::Invalid(msg)) => msg.clone(),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn valid_person() {
        let person = form().validate(false).unwrap();
        assert_eq!(person.name, "Alice");
        assert_eq!(person.weight, 61.5);
        assert!(!person.active);
    }

    #[test]
    fn checks_in_order() {
        assert_eq!(refusal(PersonForm::default()), "Name is required.");
        assert_eq!(
            refusal(PersonForm {
                birthdate: "".to_owned(),
                gender: "".to_owned(),
                ..form()
            }),
            "You must enter a valid birthdate."
        );
        assert_eq!(
            refusal(PersonForm {
                birthdate: "27/08/1991".to_owned(),
                ..form()
            }),
            "You must enter a valid birthdate."
        );
        assert_eq!(
            refusal(PersonForm {
                gender: " ".to_owned(),
                ..form()
            }),
            "You must select a gender."
        );
        assert_eq!(
            refusal(PersonForm {
                weight: "".to_owned(),
                ..form()
            }),
            "You must enter a weight."
        );
        assert_eq!(
            refusal(PersonForm {
                weight: "heavy".to_owned(),
                ..form()
            }),
            "You must enter a valid weight."
        );
    }
}

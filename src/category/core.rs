//! Category rules: names are non-empty and unique for each user.

use rusqlite::Connection;
use time::OffsetDateTime;

use crate::{
    Error,
    category::{
        Category, CategoryForm, CategoryId, CategoryName,
        db::{
            delete_category_row, find_category_by_name, insert_category, select_categories,
            update_category,
        },
    },
    user::UserID,
};

/// Create a category for `user_id`.
///
/// # Errors
///
/// Returns [Error::EmptyName] on a blank name, or [Error::DuplicateCategoryName] if the
/// user already has a category with the same name.
pub fn create_category(
    user_id: UserID,
    form: CategoryForm,
    now: OffsetDateTime,
    connection: &Connection,
) -> Result<Category, Error> {
    let name = CategoryName::new(&form.name)?;

    if find_category_by_name(user_id, &name, connection)?.is_some() {
        return Err(Error::DuplicateCategoryName(name.to_string()));
    }

    let color = form.color.filter(|color| !color.trim().is_empty());

    insert_category(user_id, name, color, now, connection)
}

/// Rename a category of `user_id`.
///
/// Editing a category that does not exist or belongs to another user changes nothing.
///
/// # Errors
///
/// Returns [Error::EmptyName] on a blank name, or [Error::DuplicateCategoryName] if a
/// different category of the user already has the name.
pub fn edit_category(
    user_id: UserID,
    category_id: CategoryId,
    form: CategoryForm,
    connection: &Connection,
) -> Result<(), Error> {
    let name = CategoryName::new(&form.name)?;

    if let Some(existing) = find_category_by_name(user_id, &name, connection)?
        && existing.id != category_id
    {
        return Err(Error::DuplicateCategoryName(name.to_string()));
    }

    let color = form.color.as_deref().filter(|color| !color.trim().is_empty());
    update_category(user_id, category_id, &name, color, connection)?;

    Ok(())
}

/// Delete a category of `user_id`.
///
/// Deleting a category that does not exist is not an error.
///
/// # Errors
///
/// Returns [Error::CategoryInUse] while subscriptions still belong to the category.
pub fn delete_category(
    user_id: UserID,
    category_id: CategoryId,
    connection: &Connection,
) -> Result<(), Error> {
    match delete_category_row(user_id, category_id, connection) {
        Ok(_) => Ok(()),
        Err(Error::InvalidForeignKey) => Err(Error::CategoryInUse),
        Err(error) => Err(error),
    }
}

/// Retrieve the categories of `user_id` ordered by name.
pub fn list_categories(user_id: UserID, connection: &Connection) -> Result<Vec<Category>, Error> {
    select_categories(user_id, connection)
}

#[cfg(test)]
mod category_core_tests {
    use crate::{
        Error,
        category::{CategoryForm, get_category},
        db::test_utils::{TEST_NOW, get_test_connection, insert_test_user},
    };

    use super::{create_category, delete_category, edit_category, list_categories};

    fn form(name: &str) -> CategoryForm {
        CategoryForm {
            name: name.to_owned(),
            color: None,
        }
    }

    #[test]
    fn create_rejects_blank_name() {
        let connection = get_test_connection();
        let user = insert_test_user("foo@bar.baz", &connection);

        let result = create_category(user.id, form("   "), TEST_NOW, &connection);

        assert_eq!(result, Err(Error::EmptyName));
    }

    #[test]
    fn create_rejects_duplicate_name() {
        let connection = get_test_connection();
        let user = insert_test_user("foo@bar.baz", &connection);
        create_category(user.id, form("Streaming"), TEST_NOW, &connection).unwrap();

        let result = create_category(user.id, form(" Streaming "), TEST_NOW, &connection);

        assert_eq!(
            result,
            Err(Error::DuplicateCategoryName("Streaming".to_owned()))
        );
    }

    #[test]
    fn edit_to_own_name_succeeds() {
        let connection = get_test_connection();
        let user = insert_test_user("foo@bar.baz", &connection);
        let category = create_category(user.id, form("Streaming"), TEST_NOW, &connection).unwrap();

        let result = edit_category(user.id, category.id, form("Streaming"), &connection);

        assert_eq!(result, Ok(()));
    }

    #[test]
    fn edit_to_other_categorys_name_fails() {
        let connection = get_test_connection();
        let user = insert_test_user("foo@bar.baz", &connection);
        create_category(user.id, form("Streaming"), TEST_NOW, &connection).unwrap();
        let category = create_category(user.id, form("Gaming"), TEST_NOW, &connection).unwrap();

        let result = edit_category(user.id, category.id, form("Streaming"), &connection);

        assert_eq!(
            result,
            Err(Error::DuplicateCategoryName("Streaming".to_owned()))
        );
    }

    #[test]
    fn edit_renames_and_keeps_color() {
        let connection = get_test_connection();
        let user = insert_test_user("foo@bar.baz", &connection);
        let category = create_category(
            user.id,
            CategoryForm {
                name: "Streaming".to_owned(),
                color: Some("#00ff00".to_owned()),
            },
            TEST_NOW,
            &connection,
        )
        .unwrap();

        edit_category(user.id, category.id, form("Video"), &connection).unwrap();

        let got = get_category(user.id, category.id, &connection).unwrap();
        assert_eq!(got.name.as_ref(), "Video");
        assert_eq!(got.color.as_deref(), Some("#00ff00"));
    }

    #[test]
    fn edit_missing_category_is_ok() {
        let connection = get_test_connection();
        let user = insert_test_user("foo@bar.baz", &connection);

        assert_eq!(edit_category(user.id, 999, form("Video"), &connection), Ok(()));
    }

    #[test]
    fn delete_missing_category_is_ok() {
        let connection = get_test_connection();
        let user = insert_test_user("foo@bar.baz", &connection);

        assert_eq!(delete_category(user.id, 999, &connection), Ok(()));
    }

    #[test]
    fn list_only_includes_own_categories() {
        let connection = get_test_connection();
        let user = insert_test_user("foo@bar.baz", &connection);
        let other_user = insert_test_user("bar@baz.qux", &connection);
        create_category(user.id, form("Streaming"), TEST_NOW, &connection).unwrap();
        create_category(other_user.id, form("Gaming"), TEST_NOW, &connection).unwrap();

        let categories = list_categories(user.id, &connection).unwrap();

        assert_eq!(categories.len(), 1);
        assert_eq!(categories[0].name.as_ref(), "Streaming");
    }
}

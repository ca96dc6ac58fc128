table! {
    bugs (id) {
        id -> Integer,
        title -> Text,
        information -> Text,
        reported_on -> Date,
        corrected -> Bool,
    }
}

table! {
    categories (id) {
        id -> Integer,
        name -> Text,
        active -> Bool,
    }
}

table! {
    composed (menu_id, food_id) {
        menu_id -> Integer,
        food_id -> Integer,
        quantity -> Integer,
    }
}

table! {
    foods (id) {
        id -> Integer,
        name -> Text,
        category_id -> Integer,
        information -> Text,
        owner_id -> Integer,
        active -> Bool,
    }
}

table! {
    meals (id) {
        id -> Integer,
        tray_id -> Integer,
        menu_id -> Integer,
        responsible_id -> Integer,
        candidate_id -> Integer,
        information -> Text,
        started_at -> Timestamp,
        ended_at -> Nullable<Timestamp>,
        active -> Bool,
    }
}

table! {
    menus (id) {
        id -> Integer,
        name -> Text,
        information -> Text,
        active -> Bool,
        owner_id -> Integer,
    }
}

table! {
    persons (id) {
        id -> Integer,
        name -> Text,
        birthdate -> Date,
        gender -> Text,
        weight -> Double,
        active -> Bool,
    }
}

table! {
    sessions (id) {
        id -> Text,
        user_id -> Integer,
        created -> Timestamp,
    }
}

table! {
    trays (id) {
        id -> Integer,
        name -> Text,
        version_id -> Integer,
        information -> Text,
        ip -> Nullable<Text>,
        online -> Bool,
        in_use -> Bool,
        active -> Bool,
        last_seen -> Nullable<Timestamp>,
    }
}

table! {
    users (id) {
        id -> Integer,
        person_id -> Integer,
        mail -> Text,
        password_hash -> Text,
        permission -> Integer,
        active -> Bool,
        avatar -> Text,
    }
}

table! {
    versions (id) {
        id -> Integer,
        name -> Text,
        release_date -> Date,
        active -> Bool,
    }
}

joinable!(composed -> foods (food_id));
joinable!(composed -> menus (menu_id));
joinable!(foods -> categories (category_id));
joinable!(foods -> persons (owner_id));
joinable!(meals -> menus (menu_id));
joinable!(meals -> trays (tray_id));
joinable!(meals -> users (responsible_id));
joinable!(menus -> persons (owner_id));
joinable!(sessions -> users (user_id));
joinable!(trays -> versions (version_id));
joinable!(users -> persons (person_id));

allow_tables_to_appear_in_same_query!(
    bugs,
    categories,
    composed,
    foods,
    meals,
    menus,
    persons,
    sessions,
    trays,
    users,
    versions,
);

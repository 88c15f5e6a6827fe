// Mirrors src/repository/schema_sqlite.sql. Keep both in sync.

diesel::table! {
    logging (log_id) {
        log_id -> Integer,
        log_type -> Text,
        log_action -> Text,
        log_timestamp -> Text,
        log_user -> Integer,
        log_namespace -> Integer,
        log_title -> Text,
        log_comment -> Text,
        log_params -> Text,
        log_deleted -> Integer,
    }
}

diesel::table! {
    log_search (ls_field, ls_value, ls_log_id) {
        ls_field -> Text,
        ls_value -> Text,
        ls_log_id -> Integer,
    }
}

diesel::table! {
    objectcache (keyname) {
        keyname -> Text,
        value -> Nullable<Text>,
        exptime -> Nullable<Text>,
    }
}

diesel::table! {
    page (page_id) {
        page_id -> Integer,
        page_namespace -> Integer,
        page_title -> Text,
        page_is_new -> Integer,
    }
}

diesel::table! {
    recentchanges (rc_id) {
        rc_id -> Integer,
        rc_timestamp -> Text,
        rc_user -> Integer,
        rc_user_text -> Text,
        rc_namespace -> Integer,
        rc_title -> Text,
        rc_comment -> Text,
        rc_minor -> Integer,
        rc_bot -> Integer,
        rc_new -> Integer,
        rc_patrolled -> Integer,
        rc_cur_id -> Integer,
        rc_this_oldid -> Integer,
        rc_last_oldid -> Integer,
        rc_type -> Integer,
        rc_source -> Text,
        rc_old_len -> Nullable<Integer>,
        rc_new_len -> Nullable<Integer>,
        rc_deleted -> Integer,
        rc_logid -> Integer,
        rc_log_type -> Nullable<Text>,
        rc_log_action -> Nullable<Text>,
        rc_params -> Nullable<Text>,
    }
}

diesel::table! {
    revision (rev_id) {
        rev_id -> Integer,
        rev_page -> Integer,
        rev_timestamp -> Text,
        rev_user -> Integer,
        rev_user_text -> Text,
        rev_comment -> Text,
        rev_minor_edit -> Integer,
        rev_deleted -> Integer,
        rev_len -> Nullable<Integer>,
    }
}

diesel::table! {
    user (user_id) {
        user_id -> Integer,
        user_name -> Text,
    }
}

diesel::table! {
    user_groups (ug_user, ug_group) {
        ug_user -> Integer,
        ug_group -> Text,
    }
}

diesel::joinable!(revision -> page (rev_page));

diesel::allow_tables_to_appear_in_same_query!(
    logging,
    log_search,
    objectcache,
    page,
    recentchanges,
    revision,
    user,
    user_groups,
);

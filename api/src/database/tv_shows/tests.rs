use super::*;
use crate::database::test_helpers::{sample_tv_show, sample_tv_show_with, setup_test_db};
use serde_json::json;

async fn seed_shows(db: &Database) -> Vec<Value> {
    let shows = [
        sample_tv_show_with(
            1,
            "Under the Dome",
            json!({ "weight": 97, "rating": { "average": 6.5 }, "updated": 300 }),
        ),
        sample_tv_show_with(
            2,
            "Person of Interest",
            json!({
                "weight": 55,
                "rating": { "average": 8.8 },
                "genres": ["Action", "Crime", "Science-Fiction"],
                "updated": 100
            }),
        ),
        sample_tv_show_with(
            3,
            "Bitten",
            json!({
                "weight": 75,
                "rating": { "average": 7.4 },
                "genres": ["Drama", "Horror", "Romance"],
                "status": "Running",
                "language": "French",
                "network": {
                    "id": 8,
                    "name": "Space",
                    "country": { "name": "Canada", "code": "CA", "timezone": "America/Halifax" }
                },
                "updated": 200
            }),
        ),
    ];

    let mut created = Vec::new();
    for show in shows {
        created.push(db.create_tv_show(show).await.unwrap());
    }
    created
}

async fn names_for(db: &Database, query: &str) -> Vec<String> {
    let features = QueryFeatures::parse(query).unwrap();
    let (shows, _) = db.list_tv_shows(&features).await.unwrap();
    shows
        .into_iter()
        .map(|doc| doc["name"].as_str().unwrap_or_default().to_string())
        .collect()
}

#[tokio::test]
async fn test_create_assigns_id_and_version() {
    let db = setup_test_db().await;
    let created = db
        .create_tv_show(sample_tv_show(1, "Under the Dome"))
        .await
        .unwrap();

    let id = created[ID_FIELD].as_str().unwrap();
    assert!(Uuid::parse_str(id).is_ok());
    assert_eq!(created[VERSION_FIELD], 0);
    assert_eq!(created["name"], "Under the Dome");

    let keys: Vec<&String> = created.as_object().unwrap().keys().collect();
    assert_eq!(keys.first().map(|k| k.as_str()), Some(ID_FIELD));
    assert_eq!(keys.last().map(|k| k.as_str()), Some(VERSION_FIELD));
}

#[tokio::test]
async fn test_create_rejects_invalid_show() {
    let db = setup_test_db().await;
    let err = db
        .create_tv_show(json!({ "name": "Missing everything" }))
        .await
        .unwrap_err();
    assert!(matches!(
        err.downcast_ref::<ValidationError>(),
        Some(ValidationError::Malformed(_))
    ));

    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM tv_shows")
        .fetch_one(db.pool())
        .await
        .unwrap();
    assert_eq!(count, 0);
}

#[tokio::test]
async fn test_get_tv_show() {
    let db = setup_test_db().await;
    let created = db.create_tv_show(sample_tv_show(1, "Dome")).await.unwrap();
    let id = Uuid::parse_str(created[ID_FIELD].as_str().unwrap()).unwrap();

    let fetched = db.get_tv_show(&id).await.unwrap();
    assert_eq!(fetched, Some(created));
}

#[tokio::test]
async fn test_get_tv_show_not_found() {
    let db = setup_test_db().await;
    assert_eq!(db.get_tv_show(&Uuid::new_v4()).await.unwrap(), None);
}

#[tokio::test]
async fn test_list_default_order_and_projection() {
    let db = setup_test_db().await;
    seed_shows(&db).await;

    let features = QueryFeatures::parse("").unwrap();
    let (shows, _) = db.list_tv_shows(&features).await.unwrap();
    let names: Vec<&str> = shows.iter().map(|s| s["name"].as_str().unwrap()).collect();
    // newest `updated` first
    assert_eq!(names, vec!["Under the Dome", "Bitten", "Person of Interest"]);
    assert!(shows.iter().all(|s| s.get(VERSION_FIELD).is_none()));
    assert!(shows.iter().all(|s| s.get(ID_FIELD).is_some()));
}

#[tokio::test]
async fn test_list_filters_with_operators() {
    let db = setup_test_db().await;
    seed_shows(&db).await;

    assert_eq!(
        names_for(&db, "weight%5Bgte%5D=60&sort=weight").await,
        vec!["Bitten", "Under the Dome"]
    );
    assert_eq!(
        names_for(&db, "rating.average%5Blt%5D=7").await,
        vec!["Under the Dome"]
    );
    assert_eq!(
        names_for(&db, "rating%5Baverage%5D%5Bgt%5D=8").await,
        vec!["Person of Interest"]
    );
    assert_eq!(names_for(&db, "status=Running").await, vec!["Bitten"]);
    assert_eq!(
        names_for(&db, "network.country.code%5Bne%5D=US").await,
        vec!["Bitten"]
    );
}

#[tokio::test]
async fn test_list_array_fields_match_any_element() {
    let db = setup_test_db().await;
    seed_shows(&db).await;

    assert_eq!(
        names_for(&db, "genres=Horror").await,
        vec!["Bitten"]
    );
    assert_eq!(
        names_for(&db, "genres%5Bin%5D=%5B%22Crime%22%2C%22Romance%22%5D&sort=name").await,
        vec!["Bitten", "Person of Interest"]
    );
    assert_eq!(
        names_for(&db, "genres%5Ball%5D=%5B%22Drama%22%2C%22Thriller%22%5D").await,
        vec!["Under the Dome"]
    );
    assert_eq!(
        names_for(&db, "genres%5Bsize%5D=3&sort=name").await,
        vec!["Bitten", "Person of Interest", "Under the Dome"]
    );
}

#[tokio::test]
async fn test_list_text_operators() {
    let db = setup_test_db().await;
    seed_shows(&db).await;

    assert_eq!(
        names_for(&db, "name%5Bregex%5D=%5EB").await,
        vec!["Bitten"]
    );
    assert_eq!(
        names_for(&db, "name%5Bilike%5D=DOME").await,
        vec!["Under the Dome"]
    );
    assert_eq!(
        names_for(&db, "name%5Blike%5D=Person%25").await,
        vec!["Person of Interest"]
    );
    assert_eq!(
        names_for(&db, "name%5Bncontains%5D=o&sort=name").await,
        vec!["Bitten"]
    );
    assert_eq!(
        names_for(&db, "language%5Bnot%5D%5Beq%5D=English").await,
        vec!["Bitten"]
    );
}

#[tokio::test]
async fn test_list_numeric_looking_values_match_text_fields() {
    let db = setup_test_db().await;
    db.create_tv_show(sample_tv_show_with(
        10,
        "24",
        json!({ "premiered": "2001-11-06" }),
    ))
    .await
    .unwrap();
    db.create_tv_show(sample_tv_show_with(
        11,
        "Lost",
        json!({ "premiered": "2004-09-22" }),
    ))
    .await
    .unwrap();

    assert_eq!(names_for(&db, "name=24").await, vec!["24"]);
    assert_eq!(names_for(&db, "name%5Bin%5D=24").await, vec!["24"]);
    assert_eq!(
        names_for(&db, "name%5Bin%5D=%5B24%2C%22Lost%22%5D&sort=name").await,
        vec!["24", "Lost"]
    );
    assert_eq!(names_for(&db, "name%5Bne%5D=24").await, vec!["Lost"]);
    assert_eq!(names_for(&db, "name=Lost").await, vec!["Lost"]);

    assert_eq!(names_for(&db, "premiered%5Bgte%5D=2004").await, vec!["Lost"]);
    assert_eq!(names_for(&db, "premiered%5Blt%5D=2002").await, vec!["24"]);
}

#[tokio::test]
async fn test_list_existence() {
    let db = setup_test_db().await;
    seed_shows(&db).await;

    assert_eq!(names_for(&db, "webChannel%5Bexists%5D=true").await.len(), 3);
    assert!(names_for(&db, "nickname%5Bexists%5D=true").await.is_empty());
    assert_eq!(names_for(&db, "nickname%5Bnexists%5D=true").await.len(), 3);
}

#[tokio::test]
async fn test_list_pagination() {
    let db = setup_test_db().await;
    seed_shows(&db).await;

    assert_eq!(
        names_for(&db, "sort=name&page=2&limit=2").await,
        vec!["Under the Dome"]
    );
    assert_eq!(
        names_for(&db, "sort=-weight&limit=1").await,
        vec!["Under the Dome"]
    );
    assert!(names_for(&db, "page=10&limit=5").await.is_empty());
}

#[tokio::test]
async fn test_list_inclusion_projection() {
    let db = setup_test_db().await;
    seed_shows(&db).await;

    let features = QueryFeatures::parse("fields=name,rating.average&sort=name&limit=1").unwrap();
    let (shows, _) = db.list_tv_shows(&features).await.unwrap();
    assert_eq!(shows.len(), 1);

    let show = shows[0].as_object().unwrap();
    let mut keys: Vec<&str> = show.keys().map(String::as_str).collect();
    keys.sort();
    assert_eq!(keys, vec!["_id", "name", "rating"]);
    assert_eq!(shows[0]["rating"], json!({ "average": 7.4 }));
}

#[tokio::test]
async fn test_list_rejects_untranslatable_filter() {
    let db = setup_test_db().await;
    let features = QueryFeatures::parse("weight%5Bgt%5D=%5B1%2C2%5D").unwrap();
    let err = db.list_tv_shows(&features).await.unwrap_err();
    assert!(err.downcast_ref::<crate::query::QueryError>().is_some());
}

#[tokio::test]
async fn test_list_total_ignores_pagination() {
    let db = setup_test_db().await;
    seed_shows(&db).await;

    let all = QueryFeatures::parse("limit=1").unwrap();
    let (shows, total) = db.list_tv_shows(&all).await.unwrap();
    assert_eq!(shows.len(), 1);
    assert_eq!(total, 3);

    let heavy = QueryFeatures::parse("weight%5Bgt%5D=60&page=2&limit=5").unwrap();
    let (shows, total) = db.list_tv_shows(&heavy).await.unwrap();
    assert!(shows.is_empty());
    assert_eq!(total, 2);
}

#[tokio::test]
async fn test_update_merges_and_bumps_version() {
    let db = setup_test_db().await;
    let created = db.create_tv_show(sample_tv_show(1, "Dome")).await.unwrap();
    let id = Uuid::parse_str(created[ID_FIELD].as_str().unwrap()).unwrap();

    let updated = db
        .update_tv_show(
            &id,
            json!({ "name": "  Under the Dome ", "status": "Running", "_id": "other", "__v": 42 }),
        )
        .await
        .unwrap()
        .unwrap();

    assert_eq!(updated["name"], "Under the Dome");
    assert_eq!(updated["status"], "Running");
    assert_eq!(updated["runtime"], created["runtime"]);
    assert_eq!(updated[ID_FIELD], created[ID_FIELD]);
    assert_eq!(updated[VERSION_FIELD], 1);

    let fetched = db.get_tv_show(&id).await.unwrap().unwrap();
    assert_eq!(fetched, updated);
}

#[tokio::test]
async fn test_update_rejects_invalid_result() {
    let db = setup_test_db().await;
    let created = db.create_tv_show(sample_tv_show(1, "Dome")).await.unwrap();
    let id = Uuid::parse_str(created[ID_FIELD].as_str().unwrap()).unwrap();

    let err = db
        .update_tv_show(&id, json!({ "weight": -5 }))
        .await
        .unwrap_err();
    assert_eq!(
        err.downcast_ref::<ValidationError>(),
        Some(&ValidationError::Negative("weight".to_string()))
    );

    let err = db.update_tv_show(&id, json!(["not", "an", "object"])).await.unwrap_err();
    assert!(err.downcast_ref::<ValidationError>().is_some());

    // stored show untouched
    let fetched = db.get_tv_show(&id).await.unwrap().unwrap();
    assert_eq!(fetched, created);
}

#[tokio::test]
async fn test_update_not_found() {
    let db = setup_test_db().await;
    let result = db
        .update_tv_show(&Uuid::new_v4(), json!({ "name": "Nothing" }))
        .await
        .unwrap();
    assert!(result.is_none());
}

#[tokio::test]
async fn test_delete_tv_show() {
    let db = setup_test_db().await;
    let created = db.create_tv_show(sample_tv_show(1, "Dome")).await.unwrap();
    let id = Uuid::parse_str(created[ID_FIELD].as_str().unwrap()).unwrap();

    assert!(db.delete_tv_show(&id).await.unwrap());
    assert!(!db.delete_tv_show(&id).await.unwrap());
    assert_eq!(db.get_tv_show(&id).await.unwrap(), None);
}

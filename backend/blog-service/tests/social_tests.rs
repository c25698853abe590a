//! Follow graph, authorization redirects, comments and post editing over HTTP.

#[macro_use]
mod common;

use actix_web::{http::StatusCode, test};

use blog_service::models::NewPost;
use common::{get, location, post_form, test_state, token};

#[actix_web::test]
async fn anonymous_new_post_redirects_to_login() {
    let state = test_state(20);
    let app = init_app!(state);

    let resp = test::call_service(&app, get("/new/", None).to_request()).await;
    assert_eq!(resp.status(), StatusCode::FOUND);
    assert_eq!(location(&resp), "/auth/login/?next=/new/");

    let resp = test::call_service(
        &app,
        post_form("/new/", None, &[("text", "sneaky")]).to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::FOUND);
    assert_eq!(
        state.store.count_posts(blog_service::db::PostFilter::All).await.unwrap(),
        0
    );
}

#[actix_web::test]
async fn anonymous_comment_redirects_to_login() {
    let state = test_state(20);
    let app = init_app!(state);

    let resp = test::call_service(
        &app,
        post_form("/sarah/1/comment", None, &[("text", "hi")]).to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::FOUND);
    assert_eq!(location(&resp), "/auth/login/?next=/sarah/1/comment");
}

#[actix_web::test]
async fn invalid_token_is_treated_as_anonymous() {
    let state = test_state(20);
    let app = init_app!(state);

    let resp = test::call_service(&app, get("/follow/", Some("not-a-jwt")).to_request()).await;
    assert_eq!(resp.status(), StatusCode::FOUND);
    assert_eq!(location(&resp), "/auth/login/?next=/follow/");
}

#[actix_web::test]
async fn follow_feed_tracks_follow_and_unfollow() {
    let state = test_state(20);
    let app = init_app!(state);
    let sarah = token(1, "sarah");
    let dj = token(2, "dj");

    // sarah becomes known to the store on her first protected action
    test::call_service(&app, get("/new/", Some(&sarah)).to_request()).await;

    let resp = test::call_service(&app, get("/sarah/follow/", Some(&dj)).to_request()).await;
    assert_eq!(resp.status(), StatusCode::FOUND);
    assert_eq!(location(&resp), "/follow/");

    test::call_service(
        &app,
        post_form("/new/", Some(&sarah), &[("text", "Q from sarah")]).to_request(),
    )
    .await;

    let feed: serde_json::Value =
        test::call_and_read_body_json(&app, get("/follow/", Some(&dj)).to_request()).await;
    assert_eq!(feed["page"]["items"][0]["text"], "Q from sarah");
    assert_eq!(feed["followed_count"], 1);

    let profile: serde_json::Value =
        test::call_and_read_body_json(&app, get("/sarah/", Some(&dj)).to_request()).await;
    assert_eq!(profile["following"], true);
    assert_eq!(profile["follower_count"], 1);

    let resp = test::call_service(&app, get("/sarah/unfollow/", Some(&dj)).to_request()).await;
    assert_eq!(resp.status(), StatusCode::FOUND);
    assert_eq!(location(&resp), "/sarah/");

    let feed: serde_json::Value =
        test::call_and_read_body_json(&app, get("/follow/", Some(&dj)).to_request()).await;
    assert_eq!(feed["page"]["count"], 0);
    assert!(!feed.to_string().contains("Q from sarah"));
}

#[actix_web::test]
async fn follow_is_idempotent_and_self_follow_is_ignored() {
    let state = test_state(20);
    let app = init_app!(state);
    let sarah = token(1, "sarah");
    let dj = token(2, "dj");
    test::call_service(&app, get("/new/", Some(&sarah)).to_request()).await;

    for _ in 0..2 {
        let resp =
            test::call_service(&app, get("/sarah/follow/", Some(&dj)).to_request()).await;
        assert_eq!(resp.status(), StatusCode::FOUND);
    }
    assert_eq!(state.follows.follower_count(1).await.unwrap(), 1);

    let resp = test::call_service(&app, get("/sarah/follow/", Some(&sarah)).to_request()).await;
    assert_eq!(resp.status(), StatusCode::FOUND);
    assert_eq!(state.follows.following_count(1).await.unwrap(), 0);

    // unfollowing someone never followed is a no-op
    let resp = test::call_service(&app, get("/dj/unfollow/", Some(&sarah)).to_request()).await;
    assert_eq!(resp.status(), StatusCode::FOUND);

    let resp = test::call_service(&app, get("/ghost/follow/", Some(&dj)).to_request()).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[actix_web::test]
async fn comment_flow() {
    let state = test_state(20);
    state.store.upsert_user(1, "sarah").await.unwrap();
    let post = state
        .store
        .insert_post(NewPost {
            author_id: 1,
            text: "comment on me".into(),
            group_id: None,
            image: None,
        })
        .await
        .unwrap();
    let app = init_app!(state);
    let dj = token(2, "dj");
    let uri = format!("/sarah/{}/comment", post.id);

    let resp = test::call_service(
        &app,
        post_form(&uri, Some(&dj), &[("text", "   ")]).to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body: serde_json::Value = test::read_body_json(resp).await;
    assert_eq!(body["errors"]["text"][0], "This field is required.");
    assert!(state.store.list_comments(post.id).await.unwrap().is_empty());

    let resp = test::call_service(
        &app,
        post_form(&uri, Some(&dj), &[("text", "great post")]).to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::FOUND);
    assert_eq!(location(&resp), format!("/sarah/{}/", post.id));

    let detail: serde_json::Value = test::call_and_read_body_json(
        &app,
        get(&format!("/sarah/{}/", post.id), None).to_request(),
    )
    .await;
    assert_eq!(detail["comments"][0]["text"], "great post");
    assert_eq!(detail["comments"][0]["author"], "dj");

    // the post exists but not under this author
    let resp = test::call_service(
        &app,
        post_form(&format!("/dj/{}/comment", post.id), Some(&dj), &[("text", "x")])
            .to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[actix_web::test]
async fn only_the_owner_can_edit() {
    let state = test_state(20);
    let app = init_app!(state);
    let sarah = token(1, "sarah");
    let dj = token(2, "dj");

    test::call_service(
        &app,
        post_form("/new/", Some(&sarah), &[("text", "original")]).to_request(),
    )
    .await;
    let profile: serde_json::Value =
        test::call_and_read_body_json(&app, get("/sarah/", None).to_request()).await;
    let post_id = profile["page"]["items"][0]["id"].as_i64().unwrap();
    let edit_uri = format!("/sarah/{}/edit/", post_id);
    let detail_uri = format!("/sarah/{}/", post_id);

    let resp = test::call_service(
        &app,
        post_form(&edit_uri, Some(&dj), &[("text", "hijacked")]).to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::FOUND);
    assert_eq!(location(&resp), detail_uri);

    let resp = test::call_service(&app, get(&edit_uri, Some(&dj)).to_request()).await;
    assert_eq!(resp.status(), StatusCode::FOUND);
    assert_eq!(location(&resp), detail_uri);

    let detail: serde_json::Value =
        test::call_and_read_body_json(&app, get(&detail_uri, None).to_request()).await;
    assert_eq!(detail["post"]["text"], "original");

    let form: serde_json::Value =
        test::call_and_read_body_json(&app, get(&edit_uri, Some(&sarah)).to_request()).await;
    assert_eq!(form["form"]["text"], "original");

    let resp = test::call_service(
        &app,
        post_form(&edit_uri, Some(&sarah), &[("text", "edited")]).to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::FOUND);
    assert_eq!(location(&resp), detail_uri);

    let detail: serde_json::Value =
        test::call_and_read_body_json(&app, get(&detail_uri, None).to_request()).await;
    assert_eq!(detail["post"]["text"], "edited");
    let profile: serde_json::Value =
        test::call_and_read_body_json(&app, get("/sarah/", None).to_request()).await;
    assert_eq!(profile["page"]["items"][0]["text"], "edited");
}

#[actix_web::test]
async fn duplicate_group_slug_is_reported() {
    let state = test_state(20);
    let app = init_app!(state);
    let sarah = token(1, "sarah");
    let form = [("title", "Cats"), ("slug", "cats"), ("description", "meow")];

    let resp =
        test::call_service(&app, post_form("/groups/", Some(&sarah), &form).to_request()).await;
    assert_eq!(resp.status(), StatusCode::CREATED);

    let resp =
        test::call_service(&app, post_form("/groups/", Some(&sarah), &form).to_request()).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body: serde_json::Value = test::read_body_json(resp).await;
    assert_eq!(body["errors"]["slug"][0], "Group with this slug already exists.");

    let groups: serde_json::Value =
        test::call_and_read_body_json(&app, get("/groups/", None).to_request()).await;
    assert_eq!(groups["groups"].as_array().unwrap().len(), 1);
}

#[actix_web::test]
async fn username_handed_to_another_account_still_works() {
    let state = test_state(20);
    let app = init_app!(state);

    let resp = test::call_service(&app, get("/new/", Some(&token(1, "sarah"))).to_request()).await;
    assert_eq!(resp.status(), StatusCode::OK);

    // account 1 was renamed upstream and "sarah" now belongs to account 3
    let new_sarah = token(3, "sarah");
    let resp = test::call_service(&app, get("/new/", Some(&new_sarah)).to_request()).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let resp = test::call_service(
        &app,
        post_form("/new/", Some(&new_sarah), &[("text", "hello again")]).to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::FOUND);

    let sarah = state.store.find_user_by_username("sarah").await.unwrap().unwrap();
    assert_eq!(sarah.id, 3);
    let posts = state
        .store
        .fetch_posts(blog_service::db::PostFilter::Author(3), 10, 0)
        .await
        .unwrap();
    assert_eq!(posts.len(), 1);
    assert_eq!(posts[0].author, "sarah");
}

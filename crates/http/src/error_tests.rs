// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use pdm_core::TaskId;

fn task_id() -> TaskId {
    TaskId::parse("00000000000000000000000000000001").expect("valid test id")
}

#[test]
fn invalid_task_id_maps_to_bad_request() {
    let err = TaskId::parse("not-hex").unwrap_err();
    let response = HttpError::InvalidTaskId(err).into_response();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[test]
fn not_found_maps_to_404() {
    let response = HttpError::NotFound.into_response();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[test]
fn store_already_exists_maps_to_409() {
    let response = HttpError::Store(pdm_store::StoreError::AlreadyExists(task_id())).into_response();
    assert_eq!(response.status(), StatusCode::CONFLICT);
}

#[test]
fn store_not_found_maps_to_404() {
    let response = HttpError::Store(pdm_store::StoreError::NotFound(task_id())).into_response();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[test]
fn store_closed_maps_to_500() {
    let response = HttpError::Store(pdm_store::StoreError::Closed).into_response();
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
}

#[test]
fn config_error_maps_to_500() {
    let response = HttpError::Config("bad bind address".to_string()).into_response();
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
}

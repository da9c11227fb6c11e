/*
Copyright 2022 Daniel Brotsky. All rights reserved.

All of the copyrighted work in this repository is licensed under the
GNU Affero General Public License, reproduced in the LICENSE-AGPL file.
*/
use std::convert::Infallible;

use warp::Filter;

use crate::handlers;
use crate::settings::ServerConfiguration;

pub fn with_conf(
    conf: ServerConfiguration,
) -> impl Filter<Extract = (ServerConfiguration,), Error = Infallible> + Clone {
    warp::any().map(move || conf.clone())
}

pub fn status_route(
    conf: ServerConfiguration,
) -> impl Filter<Extract = impl warp::Reply, Error = warp::Rejection> + Clone {
    warp::get().and(warp::path("status")).and(with_conf(conf)).then(handlers::status)
}

pub fn pass_route(
    conf: ServerConfiguration,
) -> impl Filter<Extract = impl warp::Reply, Error = warp::Rejection> + Clone {
    warp::get()
        .and(warp::path!("passes" / String))
        .and(warp::header::optional::<String>("user-agent"))
        .and(with_conf(conf))
        .then(handlers::issue_pass)
}

pub fn routes(
    conf: ServerConfiguration,
) -> impl Filter<Extract = impl warp::Reply, Error = warp::Rejection> + Clone {
    pass_route(conf.clone()).or(status_route(conf))
}

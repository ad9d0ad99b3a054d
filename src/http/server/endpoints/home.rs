use warp::Filter;

use crate::http::encoding;
use crate::http::server::HOME_ROUTE;

fn escape(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

fn home_page(title: &str, login_route: &str) -> String {
    let title = escape(title);
    format!(
        r#"
<html>
	<head>
		<title>{title}</title>
	</head>
	<body>
		<h2>{title}</h2>
		<a href="{login}">Login</a>
	</body>
</html>
"#,
        title = title,
        login = escape(login_route)
    )
}

pub fn home_endpoint(
    title: &str,
    login_route: &str,
) -> impl warp::Filter<Extract = (impl warp::Reply,), Error = warp::Rejection> + Clone {
    let page = home_page(title, login_route);

    encoding::route(HOME_ROUTE)
        .and(warp::get())
        .map(move || warp::reply::html(page.clone()))
}

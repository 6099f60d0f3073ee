use actix_web::http::{header::ContentType, StatusCode};
use actix_web::HttpResponse;

use crate::models::instance::{InstanceInfo, OperationResult};
use crate::util::escape_html;

const STYLE: &str = "body{font-family:sans-serif;max-width:42rem;margin:2rem auto;padding:0 1rem}\
form{border:1px solid #ccc;border-radius:6px;padding:1rem;margin-bottom:1.5rem}\
label{display:block;margin:.4rem 0}\
input{width:100%;padding:.3rem;box-sizing:border-box}\
.message{padding:.6rem;background:#f4f4f4;border-radius:6px}\
table{border-collapse:collapse}td{padding:.2rem .8rem .2rem 0}";

/// Builds the console page around the outcome of the last submission.
pub fn page_response(status: StatusCode, result: &OperationResult) -> HttpResponse {
    HttpResponse::build(status)
        .content_type(ContentType::html())
        .body(render_page(result))
}

pub fn render_page(result: &OperationResult) -> String {
    let mut page = String::new();
    page.push_str("<!DOCTYPE html>\n<html>\n<head>\n<meta charset=\"utf-8\">\n");
    page.push_str("<title>EC2 Console</title>\n");
    page.push_str(&format!("<style>{}</style>\n", STYLE));
    page.push_str("</head>\n<body>\n<h1>EC2 Instance Manager</h1>\n");

    if let Some(message) = &result.message {
        page.push_str(&format!(
            "<p class=\"message\">{}</p>\n",
            escape_html(message)
        ));
    }

    if let Some(info) = &result.instance_info {
        page.push_str(&render_instance(info));
    }

    page.push_str(CREATE_FORM);
    page.push_str(DESTROY_FORM);
    page.push_str("</body>\n</html>\n");
    page
}

fn render_instance(info: &InstanceInfo) -> String {
    format!(
        "<h2>Instance details</h2>\n<table>\n\
<tr><td>ID</td><td>{id}</td></tr>\n\
<tr><td>Name</td><td>{name}</td></tr>\n\
<tr><td>State</td><td>{state}</td></tr>\n\
<tr><td>Public IP</td><td>{ip}</td></tr>\n\
<tr><td>Console</td><td><a href=\"{url}\" target=\"_blank\">Open in AWS console</a></td></tr>\n\
</table>\n",
        id = escape_html(&info.id),
        name = escape_html(&info.name),
        state = escape_html(info.state.as_str()),
        ip = escape_html(&info.public_ip),
        url = escape_html(&info.console_url),
    )
}

const CREATE_FORM: &str = "<form method=\"post\" action=\"/\">\n\
<h2>Launch instance</h2>\n\
<input type=\"hidden\" name=\"action\" value=\"create\">\n\
<label>Instance type <input name=\"instance_type\" value=\"t2.micro\" required></label>\n\
<label>AMI ID <input name=\"ami_id\" required></label>\n\
<label>Key pair name <input name=\"key_name\" required></label>\n\
<label>Security group ID <input name=\"security_group\" required></label>\n\
<label>Instance name <input name=\"instance_name\" required></label>\n\
<button type=\"submit\">Launch</button>\n\
</form>\n";

const DESTROY_FORM: &str = "<form method=\"post\" action=\"/\">\n\
<h2>Terminate instance</h2>\n\
<input type=\"hidden\" name=\"action\" value=\"destroy\">\n\
<label>Instance ID <input name=\"instance_id\" required></label>\n\
<button type=\"submit\">Terminate</button>\n\
</form>\n";

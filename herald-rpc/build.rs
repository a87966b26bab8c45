fn method(name: &str, route: &str, input: &str, output: &str) -> tonic_build::manual::Method {
    tonic_build::manual::Method::builder()
        .name(name)
        .route_name(route)
        .input_type(format!("crate::proto::{input}"))
        .output_type(format!("crate::proto::{output}"))
        .codec_path("tonic::codec::ProstCodec")
        .build()
}

fn main() {
    let service = tonic_build::manual::Service::builder()
        .name("EmailService")
        .package("email_service")
        .method(method(
            "send_emails",
            "SendEmails",
            "SendEmailsRequest",
            "SendEmailsResponse",
        ))
        .method(method(
            "find_email_by_id",
            "FindEmailById",
            "FindEmailByIdRequest",
            "FindEmailByIdResponse",
        ))
        .method(method(
            "find_emails_by_receiver",
            "FindEmailsByReceiver",
            "FindEmailsByReceiverRequest",
            "FindEmailsByReceiverResponse",
        ))
        .build();

    tonic_build::manual::Builder::new().compile(&[service]);
}

use base64::{Engine as _, engine::general_purpose::STANDARD as BASE64};
use qrcode::QrCode;
use qrcode::render::svg;

pub const ISSUER: &str = "IPAJ";

/// Key URI understood by authenticator apps.
pub fn otpauth_uri(account: &str, secret: &str) -> String {
    format!(
        "otpauth://totp/{issuer}:{account}?secret={secret}&issuer={issuer}",
        issuer = ISSUER,
        account = urlencoding::encode(account),
        secret = secret,
    )
}

/// Render `data` as an SVG QR code wrapped in a `data:` URL.
pub fn qr_data_url(data: &str) -> Result<String, qrcode::types::QrError> {
    let code = QrCode::new(data.as_bytes())?;
    let image = code
        .render::<svg::Color>()
        .min_dimensions(200, 200)
        .build();

    Ok(format!("data:image/svg+xml;base64,{}", BASE64.encode(image)))
}

use http::Response;

/// At most this much response body text is retained.
const MAX_BODY_BYTES: usize = 65536;

/// Response envelope from the Candour API: the numeric status code and the
/// body text, kept verbatim.
///
/// Classification is purely on the status code; nothing here parses the
/// body.
#[derive(Debug, Clone)]
pub struct CandourResponse {
    code: u16,
    payload: String,
}

impl CandourResponse {
    pub fn new(code: u16, payload: impl Into<String>) -> Self {
        Self {
            code,
            payload: payload.into(),
        }
    }

    /// Wrap a raw HTTP response, retaining at most [`MAX_BODY_BYTES`] of
    /// body text.
    pub fn from_http(response: Response<Vec<u8>>) -> Self {
        let code = response.status().as_u16();
        let mut payload = String::from_utf8_lossy(&response.into_body()).into_owned();
        if payload.len() > MAX_BODY_BYTES {
            // truncation must land on a char boundary
            let mut end = MAX_BODY_BYTES;
            while !payload.is_char_boundary(end) {
                end -= 1;
            }
            payload.truncate(end);
        }
        Self { code, payload }
    }

    pub fn code(&self) -> u16 {
        self.code
    }

    pub fn payload(&self) -> &str {
        &self.payload
    }

    /// Whether the status code indicates success (2xx).
    pub fn indicates_success(&self) -> bool {
        (200..300).contains(&self.code)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn success_bounds() {
        assert!(!CandourResponse::new(199, "").indicates_success());
        assert!(CandourResponse::new(200, "").indicates_success());
        assert!(CandourResponse::new(299, "").indicates_success());
        assert!(!CandourResponse::new(300, "").indicates_success());
    }

    #[test]
    fn failure_codes() {
        assert!(!CandourResponse::new(400, "bad request").indicates_success());
        assert!(!CandourResponse::new(500, "server error").indicates_success());
    }

    #[test]
    fn wraps_http_response() {
        let response = http::Response::builder()
            .status(201)
            .body(b"{\"ok\":true}".to_vec())
            .unwrap();
        let wrapped = CandourResponse::from_http(response);
        assert_eq!(wrapped.code(), 201);
        assert_eq!(wrapped.payload(), "{\"ok\":true}");
        assert!(wrapped.indicates_success());
    }

    #[test]
    fn caps_body_length() {
        let response = http::Response::builder()
            .status(200)
            .body(vec![b'a'; MAX_BODY_BYTES + 100])
            .unwrap();
        let wrapped = CandourResponse::from_http(response);
        assert_eq!(wrapped.payload().len(), MAX_BODY_BYTES);
    }

    #[test]
    fn cap_respects_char_boundaries() {
        let mut body = vec![b'a'; MAX_BODY_BYTES - 1];
        body.extend_from_slice("ä".as_bytes());
        let response = http::Response::builder().status(200).body(body).unwrap();
        let wrapped = CandourResponse::from_http(response);
        assert_eq!(wrapped.payload().len(), MAX_BODY_BYTES - 1);
    }
}

/// Generate a random 128-bit request ID as lowercase hex
pub fn generate_request_id() -> String {
    format!("{:032x}", rand::random::<u128>())
}

/// Download data from a presigned URL using HTTP
pub async fn download_from_url(url: &str) -> Result<Vec<u8>, Box<dyn std::error::Error>> {
    let client = reqwest::Client::new();
    let response = client.get(url).send().await?;

    if response.status().is_success() {
        let bytes = response.bytes().await?;
        Ok(bytes.to_vec())
    } else {
        Err(format!("Failed to download from {}: HTTP {}", url, response.status()).into())
    }
}

/// HTTP status of a GET on `url`
pub async fn url_status(url: &str) -> Result<u16, Box<dyn std::error::Error>> {
    let client = reqwest::Client::new();
    let response = client.get(url).send().await?;

    Ok(response.status().as_u16())
}

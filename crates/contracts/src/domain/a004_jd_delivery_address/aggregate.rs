use crate::domain::common::{AggregateId, BaseAggregate};
use serde::{Deserialize, Serialize};

crate::define_aggregate_id!(JdDeliveryAddressId);

/// Четырехуровневый адрес JD (провинция / город / район / поселок)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JdArea {
    pub province_id: i64,
    pub city_id: i64,
    pub county_id: i64,
    #[serde(default)]
    pub town_id: i64,
}

impl JdArea {
    /// Ключ территории в формате JD: "1_72_2819_0"
    pub fn as_key(&self) -> String {
        format!(
            "{}_{}_{}_{}",
            self.province_id, self.city_id, self.county_id, self.town_id
        )
    }
}

/// Адрес доставки получателя
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JdDeliveryAddress {
    #[serde(flatten)]
    pub base: BaseAggregate<JdDeliveryAddressId>,
    pub account_ref: String,
    pub receiver_name: String,
    pub mobile: String,
    pub email: Option<String>,
    pub area: JdArea,
    pub province_name: Option<String>,
    pub city_name: Option<String>,
    pub county_name: Option<String>,
    pub town_name: Option<String>,
    pub detail_address: String,
    pub zip_code: Option<String>,
    pub is_default: bool,
}

impl JdDeliveryAddress {
    pub fn from_dto(dto: &JdDeliveryAddressDto) -> Self {
        let base = BaseAggregate::new(
            JdDeliveryAddressId::new_v4(),
            format!("ADDR-{}", &uuid::Uuid::new_v4().to_string()[..8]),
            dto.receiver_name.clone(),
        );
        let mut address = Self {
            base,
            account_ref: dto.account_id.clone(),
            receiver_name: String::new(),
            mobile: String::new(),
            email: None,
            area: JdArea::default(),
            province_name: None,
            city_name: None,
            county_name: None,
            town_name: None,
            detail_address: String::new(),
            zip_code: None,
            is_default: false,
        };
        address.update(dto);
        address
    }

    pub fn to_string_id(&self) -> String {
        self.base.id.as_string()
    }

    pub fn update(&mut self, dto: &JdDeliveryAddressDto) {
        self.base.description = format!("{} {}", dto.receiver_name, dto.detail_address);
        self.account_ref = dto.account_id.clone();
        self.receiver_name = dto.receiver_name.clone();
        self.mobile = dto.mobile.clone();
        self.email = dto.email.clone();
        self.area = dto.area;
        self.province_name = dto.province_name.clone();
        self.city_name = dto.city_name.clone();
        self.county_name = dto.county_name.clone();
        self.town_name = dto.town_name.clone();
        self.detail_address = dto.detail_address.clone();
        self.zip_code = dto.zip_code.clone();
        self.is_default = dto.is_default;
    }

    /// Полный адрес одной строкой (для снимка в заказе)
    pub fn full_address(&self) -> String {
        [
            self.province_name.as_deref(),
            self.city_name.as_deref(),
            self.county_name.as_deref(),
            self.town_name.as_deref(),
            Some(self.detail_address.as_str()),
        ]
        .iter()
        .flatten()
        .filter(|s| !s.is_empty())
        .cloned()
        .collect::<Vec<_>>()
        .join("")
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.account_ref.trim().is_empty() {
            return Err("Account reference is required".into());
        }
        if self.receiver_name.trim().is_empty() {
            return Err("Receiver name is required".into());
        }
        if self.mobile.len() != 11 || !self.mobile.chars().all(|c| c.is_ascii_digit()) {
            return Err(format!("Invalid mobile number: {}", self.mobile));
        }
        if self.area.province_id <= 0 || self.area.city_id <= 0 || self.area.county_id <= 0 {
            return Err("Province, city and county are required".into());
        }
        if self.detail_address.trim().is_empty() {
            return Err("Detail address is required".into());
        }
        Ok(())
    }

    pub fn before_write(&mut self) {
        self.base.touch();
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JdDeliveryAddressDto {
    pub id: Option<String>,
    pub account_id: String,
    pub receiver_name: String,
    pub mobile: String,
    pub email: Option<String>,
    pub area: JdArea,
    pub province_name: Option<String>,
    pub city_name: Option<String>,
    pub county_name: Option<String>,
    pub town_name: Option<String>,
    pub detail_address: String,
    pub zip_code: Option<String>,
    #[serde(default)]
    pub is_default: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dto() -> JdDeliveryAddressDto {
        JdDeliveryAddressDto {
            id: None,
            account_id: "acc-1".into(),
            receiver_name: "Zhang San".into(),
            mobile: "13800138000".into(),
            email: None,
            area: JdArea {
                province_id: 1,
                city_id: 72,
                county_id: 2819,
                town_id: 0,
            },
            province_name: Some("北京".into()),
            city_name: Some("朝阳区".into()),
            county_name: Some("三环以内".into()),
            town_name: None,
            detail_address: "建国路 88 号".into(),
            zip_code: None,
            is_default: true,
        }
    }

    #[test]
    fn test_area_key() {
        assert_eq!(dto().area.as_key(), "1_72_2819_0");
    }

    #[test]
    fn test_full_address_skips_missing_parts() {
        let address = JdDeliveryAddress::from_dto(&dto());
        assert_eq!(address.full_address(), "北京朝阳区三环以内建国路 88 号");
    }

    #[test]
    fn test_validate_mobile() {
        let mut address = JdDeliveryAddress::from_dto(&dto());
        assert!(address.validate().is_ok());
        address.mobile = "12345".into();
        assert!(address.validate().unwrap_err().starts_with("Invalid mobile"));
    }
}

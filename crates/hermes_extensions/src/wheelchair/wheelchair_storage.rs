use crate::{
    error::CodecError,
    extension_store::EdgeValueStore,
    storage::impl_file_storage,
    types::EdgeId,
    wheelchair::wheelchair_attributes::{RECORD_BYTES, WheelchairAttributes},
};

#[derive(rkyv::Archive, rkyv::Serialize, rkyv::Deserialize)]
pub struct WheelchairStore {
    records: EdgeValueStore<[u8; RECORD_BYTES]>,
}

impl_file_storage!(WheelchairStore, "wheelchair");

impl WheelchairStore {
    pub fn new() -> Self {
        WheelchairStore {
            records: EdgeValueStore::new([0; RECORD_BYTES]),
        }
    }

    pub fn set_attributes(
        &mut self,
        edge_id: EdgeId,
        attributes: &WheelchairAttributes,
    ) -> Result<(), CodecError> {
        let record = attributes.encode()?;
        self.records.set(edge_id, record);
        Ok(())
    }

    pub fn attributes(&self, edge_id: EdgeId) -> Option<WheelchairAttributes> {
        self.records
            .get(edge_id)
            .and_then(|record| WheelchairAttributes::decode(&record))
    }

    pub fn edge_count(&self) -> usize {
        self.records.len()
    }
}

impl Default for WheelchairStore {
    fn default() -> Self {
        Self::new()
    }
}

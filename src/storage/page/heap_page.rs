// Slotted heap page
//
// Layout: a slot-usage bitmap followed by fixed-width tuple slots. With
// `t` tuple bytes, a page of `p` bytes holds
// `slots = floor(p * 8 / (t * 8 + 1))` tuples and the bitmap occupies
// `ceil(slots / 8)` bytes. Bit i of the bitmap (LSB first within each
// byte) marks slot i as used.

use crate::common::error::DbResult;
use crate::common::types::page_size;
use crate::storage::page::{PageError, PageId};
use crate::storage::tuple::{RecordId, Tuple, TupleDesc};
use crate::transaction::TransactionId;

pub struct HeapPage {
    pid: PageId,
    desc: TupleDesc,
    header: Vec<u8>,
    tuples: Vec<Option<Tuple>>,
    num_slots: usize,
    dirtier: Option<TransactionId>,
    before_image: Vec<u8>,
}

/// Number of tuple slots on a page with the given schema.
pub fn slots_per_page(desc: &TupleDesc) -> usize {
    (page_size() * 8) / (desc.tuple_size() * 8 + 1)
}

/// Size of the slot-usage bitmap for `num_slots` slots, in bytes.
fn header_size(num_slots: usize) -> usize {
    (num_slots + 7) / 8
}

impl HeapPage {
    /// Parse a page from its on-disk image.
    pub fn new(pid: PageId, data: &[u8], desc: TupleDesc) -> DbResult<Self> {
        if data.len() != page_size() {
            return Err(PageError::TruncatedImage(data.len()).into());
        }
        let num_slots = slots_per_page(&desc);
        let hdr_len = header_size(num_slots);
        let header = data[..hdr_len].to_vec();
        let tuple_size = desc.tuple_size();

        let mut tuples = Vec::with_capacity(num_slots);
        for slot in 0..num_slots {
            if header[slot / 8] & (1 << (slot % 8)) != 0 {
                let start = hdr_len + slot * tuple_size;
                let mut t = Tuple::from_bytes(&desc, &data[start..start + tuple_size])?;
                t.set_record_id(Some(RecordId { page_id: pid, slot }));
                tuples.push(Some(t));
            } else {
                tuples.push(None);
            }
        }

        Ok(HeapPage {
            pid,
            desc,
            header,
            tuples,
            num_slots,
            dirtier: None,
            before_image: data.to_vec(),
        })
    }

    /// A zeroed page image: every slot unused.
    pub fn empty_page_data() -> Vec<u8> {
        vec![0u8; page_size()]
    }

    pub fn id(&self) -> PageId {
        self.pid
    }

    pub fn desc(&self) -> &TupleDesc {
        &self.desc
    }

    pub fn num_slots(&self) -> usize {
        self.num_slots
    }

    pub fn empty_slot_count(&self) -> usize {
        self.tuples.iter().filter(|t| t.is_none()).count()
    }

    fn slot_used(&self, slot: usize) -> bool {
        self.header[slot / 8] & (1 << (slot % 8)) != 0
    }

    fn set_slot(&mut self, slot: usize, used: bool) {
        if used {
            self.header[slot / 8] |= 1 << (slot % 8);
        } else {
            self.header[slot / 8] &= !(1 << (slot % 8));
        }
    }

    /// Store a tuple in the first empty slot, assigning its record id.
    pub fn insert_tuple(&mut self, mut tuple: Tuple) -> DbResult<()> {
        if tuple.desc() != &self.desc {
            return Err(PageError::SchemaMismatch.into());
        }
        let slot = self
            .tuples
            .iter()
            .position(|t| t.is_none())
            .ok_or(PageError::PageFull)?;
        tuple.set_record_id(Some(RecordId {
            page_id: self.pid,
            slot,
        }));
        self.set_slot(slot, true);
        self.tuples[slot] = Some(tuple);
        Ok(())
    }

    /// Clear the slot referenced by the tuple's record id.
    pub fn delete_tuple(&mut self, tuple: &Tuple) -> DbResult<()> {
        let rid = tuple.record_id().ok_or(PageError::MissingRecordId)?;
        if rid.page_id != self.pid {
            return Err(PageError::WrongPage.into());
        }
        if rid.slot >= self.num_slots {
            return Err(PageError::InvalidSlot(rid.slot).into());
        }
        if !self.slot_used(rid.slot) {
            return Err(PageError::EmptySlot(rid.slot).into());
        }
        self.set_slot(rid.slot, false);
        self.tuples[rid.slot] = None;
        Ok(())
    }

    /// Iterate over the tuples in used slots, in slot order.
    pub fn iter(&self) -> impl Iterator<Item = &Tuple> {
        self.tuples.iter().filter_map(|t| t.as_ref())
    }

    /// Re-serialize the page to its on-disk image.
    pub fn page_data(&self) -> Vec<u8> {
        let mut data = Vec::with_capacity(page_size());
        data.extend_from_slice(&self.header);
        let tuple_size = self.desc.tuple_size();
        for slot in &self.tuples {
            match slot {
                Some(t) => data.extend_from_slice(&t.to_bytes()),
                None => data.extend(std::iter::repeat(0u8).take(tuple_size)),
            }
        }
        data.resize(page_size(), 0);
        data
    }

    pub fn dirtier(&self) -> Option<TransactionId> {
        self.dirtier
    }

    pub fn mark_dirty(&mut self, dirtier: Option<TransactionId>) {
        self.dirtier = dirtier;
    }

    /// The last committed image of this page, used for undo logging.
    pub fn before_image(&self) -> &[u8] {
        &self.before_image
    }

    /// Snapshot the current contents as the new before-image.
    pub fn set_before_image(&mut self) {
        self.before_image = self.page_data();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::tuple::{Field, Type};

    fn int_pair_desc() -> TupleDesc {
        TupleDesc::new(
            vec![Type::Int, Type::Int],
            vec!["a".to_string(), "b".to_string()],
        )
    }

    fn int_tuple(desc: &TupleDesc, a: i32, b: i32) -> Tuple {
        Tuple::new(desc.clone(), vec![Field::Int(a), Field::Int(b)])
    }

    #[test]
    fn test_slot_arithmetic() {
        let desc = int_pair_desc();
        // 8-byte tuples: floor(4096 * 8 / 65) slots on a default page
        assert_eq!(slots_per_page(&desc), (page_size() * 8) / 65);
    }

    #[test]
    fn test_empty_page_has_all_slots_free() {
        let desc = int_pair_desc();
        let pid = PageId::new(1, 0);
        let page = HeapPage::new(pid, &HeapPage::empty_page_data(), desc.clone()).unwrap();
        assert_eq!(page.empty_slot_count(), page.num_slots());
        assert_eq!(page.iter().count(), 0);
    }

    #[test]
    fn test_insert_assigns_record_id_and_round_trips() {
        let desc = int_pair_desc();
        let pid = PageId::new(7, 3);
        let mut page = HeapPage::new(pid, &HeapPage::empty_page_data(), desc.clone()).unwrap();

        page.insert_tuple(int_tuple(&desc, 1, 10)).unwrap();
        page.insert_tuple(int_tuple(&desc, 2, 20)).unwrap();
        assert_eq!(page.empty_slot_count(), page.num_slots() - 2);

        let reparsed = HeapPage::new(pid, &page.page_data(), desc.clone()).unwrap();
        let tuples: Vec<&Tuple> = reparsed.iter().collect();
        assert_eq!(tuples.len(), 2);
        assert_eq!(tuples[0].field(0), &Field::Int(1));
        assert_eq!(tuples[1].field(1), &Field::Int(20));
        assert_eq!(
            tuples[0].record_id(),
            Some(RecordId {
                page_id: pid,
                slot: 0
            })
        );
    }

    #[test]
    fn test_delete_frees_slot() {
        let desc = int_pair_desc();
        let pid = PageId::new(1, 0);
        let mut page = HeapPage::new(pid, &HeapPage::empty_page_data(), desc.clone()).unwrap();

        page.insert_tuple(int_tuple(&desc, 5, 50)).unwrap();
        let stored = page.iter().next().unwrap().clone();
        page.delete_tuple(&stored).unwrap();
        assert_eq!(page.empty_slot_count(), page.num_slots());

        // Deleting again reports the empty slot
        match page.delete_tuple(&stored) {
            Err(crate::common::error::DbError::Page(PageError::EmptySlot(0))) => {}
            other => panic!("expected EmptySlot error, got {:?}", other.err()),
        }
    }

    #[test]
    fn test_delete_rejects_foreign_tuple() {
        let desc = int_pair_desc();
        let mut page =
            HeapPage::new(PageId::new(1, 0), &HeapPage::empty_page_data(), desc.clone()).unwrap();
        let mut foreign = int_tuple(&desc, 9, 90);
        foreign.set_record_id(Some(RecordId {
            page_id: PageId::new(2, 0),
            slot: 0,
        }));
        assert!(page.delete_tuple(&foreign).is_err());
    }

    #[test]
    fn test_page_fills_to_capacity() {
        let desc = int_pair_desc();
        let mut page =
            HeapPage::new(PageId::new(1, 0), &HeapPage::empty_page_data(), desc.clone()).unwrap();
        for i in 0..page.num_slots() {
            page.insert_tuple(int_tuple(&desc, i as i32, 0)).unwrap();
        }
        assert_eq!(page.empty_slot_count(), 0);
        match page.insert_tuple(int_tuple(&desc, -1, -1)) {
            Err(crate::common::error::DbError::Page(PageError::PageFull)) => {}
            other => panic!("expected PageFull, got {:?}", other.err()),
        }
    }

    #[test]
    fn test_before_image_tracks_snapshots() {
        let desc = int_pair_desc();
        let mut page =
            HeapPage::new(PageId::new(1, 0), &HeapPage::empty_page_data(), desc.clone()).unwrap();
        let original = page.before_image().to_vec();

        page.insert_tuple(int_tuple(&desc, 1, 1)).unwrap();
        // Mutation alone leaves the before-image at the last snapshot
        assert_eq!(page.before_image(), original.as_slice());

        page.set_before_image();
        assert_eq!(page.before_image(), page.page_data().as_slice());
    }
}
